fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/library.proto");

    // Server for the service itself, client for the end-to-end tests and
    // the bearer interceptor.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/library.proto"], &["proto"])?;

    Ok(())
}
