mod runtime;
mod shell;

fn main() {
    if let Err(e) = runtime::run_from_args() {
        eprintln!("motor-sim: {e}");
        std::process::exit(1);
    }
}
