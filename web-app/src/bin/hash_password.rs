use std::io::{self, BufRead};

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};

/// Prints an Argon2 hash for the `admin.password_hash` setting.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Password to hash. Read from the first line of stdin when omitted.
    #[arg(short, long)]
    password: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let password = match args.password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err(eyre!("Refusing to hash an empty password."));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre!("Failed to hash password: {e}"))?;

    println!("{hash}");
    Ok(())
}
