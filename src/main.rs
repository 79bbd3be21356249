fn main() {
    if let Err(err) = labelprep::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
