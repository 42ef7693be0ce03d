fn main() {
    if let Err(err) = duochat::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
