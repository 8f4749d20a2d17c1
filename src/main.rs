fn main() {
    if let Err(err) = kube_appmap::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
