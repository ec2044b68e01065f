fn main() -> anyhow::Result<()> {
    // Exit 0 on operator quit; non-zero only when startup is unrecoverable.
    deckhand::run()
}
