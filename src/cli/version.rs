/// Display version information
pub fn execute() {
    println!("govgate {}", env!("CARGO_PKG_VERSION"));
    println!("Governance workflow engine for release pipelines");
}
