fn main() {
    if let Err(e) = liftbench::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
