pub fn init() {
    use env_logger::Target;
    use std::fs;
    use std::io;

    // The TUI owns stdout, so diagnostics go to a file under the state dir.
    // If we cannot create it (permissions, readonly FS), fall back to stderr.
    let target = (|| -> io::Result<Target> {
        let dir = crate::config::state_dir();
        fs::create_dir_all(&dir)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("deckhand.log"))?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    env_logger::Builder::from_default_env()
        .target(target)
        .filter_level(log::LevelFilter::Info)
        .init();
}
