//! Context export and import
//!
//! A bundle is a tar stream holding `metadata.json` followed by one
//! `tls/<endpoint>/<file>` entry per stored TLS file. Export writes entries
//! one file at a time; import consumes the whole stream before creating the
//! context, so a truncated bundle never produces a half-imported context.

pub mod pipe;

use log::{debug, info};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path};
use std::thread;

use tar::{Archive, Builder, EntryType, Header};
use tempfile::NamedTempFile;

use crate::config::store as store_config;
use crate::context::{
    check_path_component, validate_context_name, Context, ContextStore, ContextTls,
};
use crate::error::{CtxError, Result};

pub use pipe::{pipe, PipeReader, PipeWriter};

/// Top-level bundle directory holding TLS material
const TLS_PREFIX: &str = "tls";

/// Tar block size; an archive ends with two zero blocks
const BLOCK_SIZE: u64 = 512;

/// What an export produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Full context bundle
    #[default]
    Bundle,
    /// Kubernetes endpoint only, as a kubeconfig document
    Kubeconfig,
}

fn write_err(e: io::Error) -> CtxError {
    CtxError::io("Failed to write bundle", e)
}

fn read_err(e: io::Error) -> CtxError {
    match e.kind() {
        io::ErrorKind::Other | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            CtxError::Decode(format!("malformed bundle: {}", e))
        }
        _ => CtxError::io("Failed to read bundle", e),
    }
}

fn append_entry<W: Write>(builder: &mut Builder<W>, path: &str, mode: u32, data: &[u8]) -> Result<()> {
    let mut header = Header::new_ustar();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(mode);
    header.set_mtime(0);
    builder
        .append_data(&mut header, path, data)
        .map_err(write_err)?;
    debug!("Bundle entry {} ({} bytes)", path, data.len());
    Ok(())
}

/// Write the bundle of context `name` to `writer`
pub fn export<W: Write>(store: &ContextStore, name: &str, writer: W) -> Result<()> {
    let context = store.get_context_metadata(name)?;
    let listed = store.list_context_tls_files(name)?;

    let mut builder = Builder::new(writer);
    append_entry(&mut builder, store_config::META_FILE, 0o644, &context.to_json()?)?;
    for (endpoint, files) in &listed {
        for file in files {
            let data = store.get_context_tls_data(name, endpoint, file)?;
            let path = format!("{}/{}/{}", TLS_PREFIX, endpoint, file);
            append_entry(&mut builder, &path, 0o600, &data)?;
        }
    }

    let mut writer = builder.into_inner().map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    info!("Exported context {:?}", name);
    Ok(())
}

/// Write the Kubernetes endpoint of context `name` as a kubeconfig document
pub fn export_kubeconfig<W: Write>(store: &ContextStore, name: &str, mut writer: W) -> Result<()> {
    let context = store.get_context_metadata(name)?;
    let meta = context.kubernetes_endpoint().ok_or_else(|| {
        CtxError::Validation(format!("context {:?} has no kubernetes endpoint", name))
    })?;
    let endpoint = meta.with_tls_data(store, name)?;
    let yaml = endpoint.kubeconfig(name).to_yaml()?;

    writer.write_all(yaml.as_bytes()).map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    info!("Exported context {:?} as kubeconfig", name);
    Ok(())
}

/// Export in `format` to `writer`
pub fn export_as<W: Write>(
    store: &ContextStore,
    name: &str,
    format: ExportFormat,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Bundle => export(store, name, writer),
        ExportFormat::Kubeconfig => export_kubeconfig(store, name, writer),
    }
}

/// Export to a file, replacing it only once the export completed
pub fn export_to_path(
    store: &ContextStore,
    name: &str,
    format: ExportFormat,
    path: &Path,
) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(parent).map_err(|e| {
        CtxError::io(format!("Failed to create temp file in {}", parent.display()), e)
    })?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        export_as(store, name, format, &mut writer)?;
        writer.flush().map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| {
        CtxError::io(format!("Failed to write {}", path.display()), e.error)
    })?;
    Ok(())
}

/// Where a bundle entry belongs
enum EntryKind {
    Metadata,
    Tls { endpoint: String, file: String },
}

fn classify_entry(path: &Path) -> Result<EntryKind> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(CtxError::Decode(format!(
                    "invalid bundle entry path {}",
                    path.display()
                )))
            }
        }
    }

    match parts.as_slice() {
        [meta] if meta == store_config::META_FILE => Ok(EntryKind::Metadata),
        [prefix, endpoint, file] if prefix == TLS_PREFIX => {
            for (kind, value) in [("endpoint", endpoint), ("TLS file", file)] {
                check_path_component(kind, value)
                    .map_err(|e| CtxError::Decode(format!("invalid bundle entry: {}", e)))?;
            }
            Ok(EntryKind::Tls {
                endpoint: endpoint.clone(),
                file: file.clone(),
            })
        }
        _ => Err(CtxError::Decode(format!(
            "unexpected bundle entry {}",
            path.display()
        ))),
    }
}

/// Sink for whatever follows the last entry. Only zero blocks are allowed there
struct TrailerCheck {
    len: u64,
    zeroed: bool,
}

impl TrailerCheck {
    fn new() -> Self {
        Self { len: 0, zeroed: true }
    }

    /// `entries()` consumes the first zero block, so at least one more must follow
    fn is_complete(&self) -> bool {
        self.zeroed && self.len >= BLOCK_SIZE
    }
}

impl Write for TrailerCheck {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.len += buf.len() as u64;
        self.zeroed &= buf.iter().all(|b| *b == 0);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Decode a bundle into its context and TLS material; the stream is read to the end
fn read_bundle<R: Read>(store: &ContextStore, reader: R) -> Result<(Context, ContextTls)> {
    let mut archive = Archive::new(reader);
    let mut metadata: Option<Vec<u8>> = None;
    let mut tls = ContextTls::new();

    for entry in archive.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            continue;
        }
        let path = entry.path().map_err(read_err)?.into_owned();
        if !entry_type.is_file() {
            return Err(CtxError::Decode(format!(
                "unsupported bundle entry type for {}",
                path.display()
            )));
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(read_err)?;
        if data.len() as u64 != entry.size() {
            return Err(CtxError::Decode(format!(
                "truncated bundle: entry {} is incomplete",
                path.display()
            )));
        }

        match classify_entry(&path)? {
            EntryKind::Metadata => {
                if metadata.is_some() {
                    return Err(CtxError::Decode(format!(
                        "bundle contains more than one {}",
                        store_config::META_FILE
                    )));
                }
                metadata = Some(data);
            }
            EntryKind::Tls { endpoint, file } => {
                debug!("Bundle TLS entry {}/{}", endpoint, file);
                tls.insert(&endpoint, &file, data);
            }
        }
    }

    // Drain end-of-archive padding so a piped producer can finish
    let mut inner = archive.into_inner();
    let mut trailer = TrailerCheck::new();
    io::copy(&mut inner, &mut trailer).map_err(read_err)?;
    if !trailer.is_complete() {
        return Err(CtxError::Decode(
            "truncated bundle: missing end-of-archive marker".to_string(),
        ));
    }

    let metadata = metadata.ok_or_else(|| {
        CtxError::Decode(format!("bundle has no {}", store_config::META_FILE))
    })?;
    let context = Context::from_json(&metadata, store.registry())?;

    for endpoint in tls.endpoints.keys() {
        if !context.endpoints.contains_key(endpoint) {
            return Err(CtxError::Decode(format!(
                "bundle has TLS material for unknown endpoint {:?}",
                endpoint
            )));
        }
    }
    Ok((context, tls))
}

/// Decode a bundle stream into context `name` without touching the store
fn prepare_import<R: Read>(
    store: &ContextStore,
    name: &str,
    reader: R,
) -> Result<(Context, ContextTls)> {
    validate_context_name(name)?;
    if store.context_exists(name)? {
        return Err(CtxError::AlreadyExists(format!(
            "context {:?} already exists",
            name
        )));
    }

    let (mut context, tls) = read_bundle(store, reader)?;
    debug!("Importing bundle of context {:?} as {:?}", context.name, name);
    context.name = name.to_string();
    Ok((context, tls))
}

fn commit_import(store: &ContextStore, context: &Context, tls: &ContextTls) -> Result<()> {
    let tls = Some(tls).filter(|tls| !tls.is_empty());
    store.create_context(context, tls)?;
    info!("Imported context {:?}", context.name);
    Ok(())
}

/// Create context `name` from a bundle stream
pub fn import<R: Read>(store: &ContextStore, name: &str, reader: R) -> Result<Context> {
    let (context, tls) = prepare_import(store, name, reader)?;
    commit_import(store, &context, &tls)?;
    Ok(context)
}

/// Create context `name` from a bundle file
pub fn import_from_path(store: &ContextStore, name: &str, path: &Path) -> Result<Context> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CtxError::NotFound(format!("file {} does not exist", path.display()))
        } else {
            CtxError::io(format!("Failed to open {}", path.display()), e)
        }
    })?;
    import(store, name, io::BufReader::new(file))
}

/// Copy context `from` to a new context `to`, streaming the bundle through
/// an in-process pipe between an exporting thread and the importer
pub fn copy_context(store: &ContextStore, from: &str, to: &str) -> Result<Context> {
    // Fail before spawning anything when the source is missing
    store.get_context_metadata(from)?;

    thread::scope(|scope| {
        let (reader, writer) = pipe();
        let producer = scope.spawn(move || export(store, from, writer));

        let decoded = prepare_import(store, to, reader);
        let exported = producer
            .join()
            .map_err(|_| CtxError::Config("export thread panicked".to_string()))?;

        // A failed import closes the pipe; its own error is the one to report
        let (context, tls) = decoded?;
        exported?;
        commit_import(store, &context, &tls)?;
        Ok(context)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Orchestrator;
    use crate::endpoint::{DockerEndpointMeta, KubernetesEndpointMeta};
    use crate::kubeconfig::KubeConfigLoader;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> ContextStore {
        ContextStore::new(dir.path().join("contexts"))
    }

    fn create_test_context_with_kube(store: &ContextStore) {
        let ctx = Context::new("test")
            .with_description("description of test")
            .with_orchestrator(Orchestrator::All)
            .with_endpoint(DockerEndpointMeta::new("https://someswarmserver"))
            .with_endpoint(KubernetesEndpointMeta::new("https://someserver", "default"));
        let mut tls = ContextTls::new();
        tls.insert("kubernetes", "ca.pem", b"ca-bytes".to_vec());
        tls.insert("kubernetes", "cert.pem", b"cert-bytes".to_vec());
        tls.insert("kubernetes", "key.pem", b"key-bytes".to_vec());
        tls.insert("docker", "ca.pem", b"docker-ca".to_vec());
        store.create_context(&ctx, Some(&tls)).unwrap();
    }

    fn assert_same_context(store: &ContextStore, a: &str, b: &str) {
        let first = store.get_context_metadata(a).unwrap();
        let second = store.get_context_metadata(b).unwrap();
        assert_eq!(first.endpoints, second.endpoints);
        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.name, a);
        assert_eq!(second.name, b);
        assert_eq!(
            store.get_context_tls(a).unwrap(),
            store.get_context_tls(b).unwrap()
        );
    }

    fn bundle_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        for (path, data) in entries {
            append_entry(&mut builder, path, 0o644, data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_export_import_with_buffer() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let mut buf = Vec::new();
        export(&store, "test", &mut buf).unwrap();
        import(&store, "test2", Cursor::new(buf)).unwrap();

        assert_same_context(&store, "test", "test2");
    }

    #[test]
    fn test_export_import_with_file() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let file = dir.path().join("exported");
        export_to_path(&store, "test", ExportFormat::Bundle, &file).unwrap();
        import_from_path(&store, "test2", &file).unwrap();

        assert_same_context(&store, "test", "test2");
    }

    #[test]
    fn test_export_import_piped() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        copy_context(&store, "test", "test2").unwrap();
        assert_same_context(&store, "test", "test2");
    }

    #[test]
    fn test_export_entry_order() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let mut buf = Vec::new();
        export(&store, "test", &mut buf).unwrap();

        let mut archive = Archive::new(Cursor::new(buf));
        let paths: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            paths,
            vec![
                "metadata.json",
                "tls/docker/ca.pem",
                "tls/kubernetes/ca.pem",
                "tls/kubernetes/cert.pem",
                "tls/kubernetes/key.pem",
            ]
        );
    }

    #[test]
    fn test_import_existing_name_fails() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let mut buf = Vec::new();
        export(&store, "test", &mut buf).unwrap();
        let err = import(&store, "test", Cursor::new(buf)).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_piped_import_to_existing_name_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let err = copy_context(&store, "test", "test").unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_copy_missing_source_not_found() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        assert!(copy_context(&store, "nope", "other").unwrap_err().is_not_found());
        assert!(!store.context_exists("other").unwrap());
    }

    #[test]
    fn test_import_reserved_name_fails() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let mut buf = Vec::new();
        export(&store, "test", &mut buf).unwrap();
        assert!(import(&store, "default", Cursor::new(buf))
            .unwrap_err()
            .is_invalid_name());
    }

    #[test]
    fn test_import_rejects_missing_metadata() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let bundle = bundle_with(&[("tls/docker/ca.pem", b"ca")]);
        let err = import(&store, "x", Cursor::new(bundle)).unwrap_err();
        assert!(err.is_decode());
        assert!(!store.context_exists("x").unwrap());
    }

    #[test]
    fn test_import_rejects_unknown_entry() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let bundle = bundle_with(&[
            ("metadata.json", br#"{"Name":"a","Metadata":{},"Endpoints":{}}"#),
            ("extra.txt", b"??"),
        ]);
        assert!(import(&store, "x", Cursor::new(bundle)).unwrap_err().is_decode());
    }

    #[test]
    fn test_import_rejects_traversal() {
        assert!(classify_entry(Path::new("tls/../../etc/passwd")).is_err());
        assert!(classify_entry(Path::new("/metadata.json")).is_err());
        assert!(classify_entry(Path::new("tls/docker/sub/ca.pem")).is_err());
        assert!(matches!(
            classify_entry(Path::new("./metadata.json")).unwrap(),
            EntryKind::Metadata
        ));
    }

    #[test]
    fn test_import_rejects_tls_for_unknown_endpoint() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let bundle = bundle_with(&[
            ("metadata.json", br#"{"Name":"a","Metadata":{},"Endpoints":{}}"#),
            ("tls/kubernetes/ca.pem", b"ca"),
        ]);
        assert!(import(&store, "x", Cursor::new(bundle)).unwrap_err().is_decode());
    }

    #[test]
    fn test_import_rejects_kubernetes_orchestrator_without_endpoint() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let bundle = bundle_with(&[(
            "metadata.json",
            br#"{"Name":"a","Metadata":{"StackOrchestrator":"all"},"Endpoints":{"docker":{"Host":"tcp://h:2376","SkipTLSVerify":false}}}"#,
        )]);
        assert!(import(&store, "x", Cursor::new(bundle)).unwrap_err().is_validation());
        assert!(!store.context_exists("x").unwrap());
    }

    #[test]
    fn test_import_rejects_duplicate_metadata() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let meta: &[u8] = br#"{"Name":"a","Metadata":{},"Endpoints":{}}"#;
        let bundle = bundle_with(&[("metadata.json", meta), ("metadata.json", meta)]);
        assert!(import(&store, "x", Cursor::new(bundle)).unwrap_err().is_decode());
    }

    #[test]
    fn test_import_garbage_stream() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let err = import(&store, "x", Cursor::new(vec![7u8; 600])).unwrap_err();
        assert!(err.is_decode());
        assert!(!store.context_exists("x").unwrap());
    }

    fn exported_test_bundle(store: &ContextStore) -> Vec<u8> {
        create_test_context_with_kube(store);
        let mut buf = Vec::new();
        export(store, "test", &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_import_rejects_truncated_bundle() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let buf = exported_test_bundle(&store);

        let last_header = Archive::new(Cursor::new(buf.clone()))
            .entries()
            .unwrap()
            .map(|e| e.unwrap().raw_header_position())
            .last()
            .unwrap() as usize;

        let block = BLOCK_SIZE as usize;
        for cut in [last_header, buf.len() - 2 * block, buf.len() - block, buf.len() - 100] {
            let err = import(&store, "cut", Cursor::new(buf[..cut].to_vec())).unwrap_err();
            assert!(err.is_decode(), "cut at {} gave {:?}", cut, err);
            assert!(!store.context_exists("cut").unwrap());
        }

        import(&store, "whole", Cursor::new(buf)).unwrap();
    }

    #[test]
    fn test_import_rejects_data_after_last_entry() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let mut buf = exported_test_bundle(&store);
        let len = buf.len();
        buf[len - 1] = 1;
        assert!(import(&store, "x", Cursor::new(buf)).unwrap_err().is_decode());
        assert!(!store.context_exists("x").unwrap());
    }

    #[test]
    fn test_piped_import_of_interrupted_export_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let buf = exported_test_bundle(&store);

        let (reader, mut writer) = pipe();
        let producer = thread::spawn(move || {
            // The exporter stops before the end-of-archive blocks
            let _ = writer.write_all(&buf[..buf.len() - 2 * BLOCK_SIZE as usize]);
        });
        let err = import(&store, "test2", reader).unwrap_err();
        producer.join().unwrap();

        assert!(err.is_decode());
        assert!(!store.context_exists("test2").unwrap());
    }

    #[test]
    fn test_export_missing_context() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let mut buf = Vec::new();
        assert!(export(&store, "nope", &mut buf).unwrap_err().is_not_found());
    }

    #[test]
    fn test_export_to_closed_pipe_is_error() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let (reader, writer) = pipe();
        drop(reader);
        let err = export(&store, "test", writer).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_kubeconfig_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        create_test_context_with_kube(&store);

        let file = dir.path().join("exported");
        export_to_path(&store, "test", ExportFormat::Kubeconfig, &file).unwrap();

        let loader = KubeConfigLoader::from_path(&file).unwrap();
        let (meta, tls) = KubernetesEndpointMeta::from_kubeconfig(&loader).unwrap();
        let mut ctx_tls = ContextTls::new();
        ctx_tls.set_endpoint("kubernetes", tls.unwrap().to_files());
        store
            .create_context(&Context::new("test2").with_endpoint(meta), Some(&ctx_tls))
            .unwrap();

        let original = store.get_context_metadata("test").unwrap();
        let imported = store.get_context_metadata("test2").unwrap();
        assert_eq!(
            original.kubernetes_endpoint().unwrap().host,
            imported.kubernetes_endpoint().unwrap().host
        );
        for file in ["ca.pem", "cert.pem", "key.pem"] {
            assert_eq!(
                store.get_context_tls_data("test", "kubernetes", file).unwrap(),
                store.get_context_tls_data("test2", "kubernetes", file).unwrap()
            );
        }
    }

    #[test]
    fn test_kubeconfig_export_needs_kubernetes_endpoint() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store
            .create_context(
                &Context::new("docker-only").with_endpoint(DockerEndpointMeta::new("tcp://h:1")),
                None,
            )
            .unwrap();
        let mut buf = Vec::new();
        assert!(export_kubeconfig(&store, "docker-only", &mut buf)
            .unwrap_err()
            .is_validation());
    }
}
