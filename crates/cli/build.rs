use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("rankwatch")
        .version("0.3.0")
        .author("Rankwatch Contributors")
        .about("Scrape ranked app and model leaderboards")
        .arg(clap::arg!(<INPUT> "Rankings URL, snapshot directory, HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-c --category <CATEGORY> "Leaderboard to scrape (apps, models)")
                .value_name("CATEGORY")
                .default_value("apps")
                .value_parser(["apps", "models"]),
        )
        .arg(clap::arg!(-m --max <NUM> "Maximum entries kept per period").default_value("20"))
        .arg(clap::arg!(-p --period <LABEL> "Time period label to scrape (repeatable)").action(clap::ArgAction::Append))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(
            clap::arg!(--domains <DIR> "Directory holding a custom domains.txt")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--sqlite <FILE> "Store records in this SQLite database")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--table <NAME> "Table to store records in").value_name("NAME"))
        .arg(
            clap::arg!(--"fallback-dir" <DIR> "Directory for the JSON export when storing fails")
                .value_name("DIR")
                .default_value(".")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (table, json, json-periods, csv)")
                .value_name("FORMAT")
                .default_value("table")
                .value_parser(["table", "json", "json-periods", "csv"]),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "rankwatch", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "rankwatch", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "rankwatch", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "rankwatch", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
