use bcrypt::{hash, verify, DEFAULT_COST};
use std::env;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
    std::process::exit(1);
}

fn main() {
    let mut args = env::args().skip(1);
    let password = args.next().unwrap_or_else(|| usage());
    let cost = match args.next() {
        Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| usage()),
        None => DEFAULT_COST,
    };

    let hashed = match hash(&password, cost) {
        Ok(hashed) => hashed,
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    };

    if !matches!(verify(&password, &hashed), Ok(true)) {
        eprintln!("Generated hash failed verification");
        std::process::exit(1);
    }

    println!("\nCost     : {}", cost);
    println!("Hash     : {}\n", hashed);
    println!("# Paste this into your .env to seed the admin account:");
    println!("ADMIN_HASH_PASSWORD={}", hashed);
}
