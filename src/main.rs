fn main() {
    if let Err(err) = groupdock::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
