use ructe::Ructe;
use std::fs::create_dir_all;
use std::path::Path;

fn main() {
    Ructe::from_env()
        .expect("This must be run with cargo")
        .compile_templates("templates")
        .expect("compile templates");

    create_dir_all(&Path::new("static").join("media")).expect("Couldn't init media directory");
}
