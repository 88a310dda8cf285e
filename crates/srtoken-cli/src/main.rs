fn main() {
    if let Err(e) = srtoken_cli::run() {
        eprintln!("Error: {e}");
        for suggestion in e.suggestions() {
            eprintln!("  hint: {suggestion}");
        }
        std::process::exit(1);
    }
}
