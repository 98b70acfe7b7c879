fn main() {
    let args: Vec<String> = std::env::args().collect();
    std::process::exit(webinstaller::run_cli(&args));
}
