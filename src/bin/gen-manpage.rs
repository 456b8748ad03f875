//! Man pages for nicnvm
//!
//! Writes `nicnvm.1` plus one `nicnvm-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: clap::Command, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    fs::write(path, buffer)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let main_page = output_dir.join("nicnvm.1");
    render(cmd.clone(), &main_page)?;

    let mut pages = 1;
    for sub in cmd.get_subcommands() {
        render(sub.clone(), &output_dir.join(format!("nicnvm-{}.1", sub.get_name())))?;
        pages += 1;
    }

    println!("Wrote {} man pages to {}", pages, output_dir.display());
    println!("  man -l {}", main_page.display());

    Ok(())
}
