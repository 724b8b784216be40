fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR");
    let proto_path = format!("{}/proto/kaas.proto", manifest_dir);

    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path().expect("vendored protoc");
        std::env::set_var("PROTOC", protoc);
    }

    tonic_build::compile_protos(&proto_path)
        .expect("Failed to compile proto files with tonic-build");

    println!("cargo:rerun-if-changed={}", proto_path);
}
