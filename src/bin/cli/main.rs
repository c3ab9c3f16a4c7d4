//! Small inspection tool built on the `streamio` library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use streamio::backend::FileStream;
use streamio::stream::OpenMode;
use streamio::walker::{self, WalkFlags};
use streamio::{Error, Stream};

/// Inspect files, archives, and compressed streams through `streamio`.
#[derive(Parser)]
#[command(name = "streamio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recursively list a directory, expanding archives and decompressing
    /// members along the way.
    Walk {
        /// Root path to walk.
        root: PathBuf,
        /// Do not expand archive containers encountered during the walk.
        #[arg(long)]
        no_archives: bool,
        /// Do not transparently decompress compressed members.
        #[arg(long)]
        no_decompress: bool,
    },
    /// Report the size of a single file stream.
    Size {
        /// File to inspect.
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Walk {
            root,
            no_archives,
            no_decompress,
        } => walk_command(&root, no_archives, no_decompress),
        Commands::Size { path } => size_command(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("streamio: {e}");
            ExitCode::FAILURE
        }
    }
}

fn walk_command(root: &PathBuf, no_archives: bool, no_decompress: bool) -> Result<(), Error> {
    let mut flags = WalkFlags::RECURSE_DIRS;
    if !no_archives {
        flags |= WalkFlags::EXPAND_ARCHIVES;
    }
    if !no_decompress {
        flags |= WalkFlags::DECOMPRESS;
    }

    let mut count = 0usize;
    walker::walk(root, flags, &mut |entry| {
        count += 1;
        let marker = if entry.is_dir() {
            "dir "
        } else if entry.is_archive_entry() {
            "arc "
        } else {
            "file"
        };
        match entry.archive_entry_path() {
            Some(member) => println!("{marker} {}!{}", entry.path().display(), member),
            None => println!("{marker} {}", entry.path().display()),
        }
        0
    })?;
    println!("{count} entries");
    Ok(())
}

fn size_command(path: &PathBuf) -> Result<(), Error> {
    let stream = FileStream::open(path, OpenMode::READ)?;
    println!("{}", stream.size()?);
    Ok(())
}
