fn main() {
    if let Err(err) = devo::run() {
        eprintln!("error: {err:#}");
        std::process::exit(devo::error::exit_code_for(&err));
    }
}
