//! Compiled Handle Cache Tests
//!
//! Tests for:
//! - compile idempotence: one native construction per (artifact, device)
//! - per-device independence: distinct handles, independent failures
//! - failure propagation: message + native code, empty slot, retry
//! - release on drop: every handle destroyed exactly once via its device
//! - linearizable first-compile under a two-thread race

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Barrier};

use prism_shader::{ComputeDevice, DeviceId, NativeError, NativeHandle, ShaderArtifact, ShaderError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counting stand-in for a GPU device backend.
struct MockDevice {
    id: DeviceId,
    creates: AtomicU32,
    destroys: AtomicU32,
    fail: AtomicBool,
}

impl MockDevice {
    fn new(id: u32) -> Arc<Self> {
        Arc::new(Self {
            id: DeviceId(id),
            creates: AtomicU32::new(0),
            destroys: AtomicU32::new(0),
            fail: AtomicBool::new(false),
        })
    }

    fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    fn destroys(&self) -> u32 {
        self.destroys.load(Ordering::SeqCst)
    }
}

impl ComputeDevice for MockDevice {
    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn create_shader_module(&self, bytecode: &[u32]) -> Result<NativeHandle, NativeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NativeError {
                code: -4,
                message: "device lost".to_string(),
            });
        }
        if bytecode.is_empty() {
            return Err(NativeError {
                code: -1,
                message: "empty module".to_string(),
            });
        }
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        // Encode device and creation index so handles are distinguishable.
        Ok(NativeHandle(u64::from(self.id.0) << 32 | u64::from(n)))
    }

    fn destroy_shader_module(&self, _handle: NativeHandle) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_artifact() -> ShaderArtifact {
    // SPIR-V magic plus a few filler words.
    ShaderArtifact::from_bytecode(vec![0x0723_0203, 0x0001_0000, 0, 1, 2])
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn compile_twice_constructs_once() {
    init_logger();
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let artifact = test_artifact();

    artifact.compile(&device).unwrap();
    artifact.compile(&device).unwrap();

    assert_eq!(mock.creates(), 1);
    assert_eq!(artifact.handle_count(), 1);
}

#[test]
fn repeat_compile_ignores_bytecode_mutation() {
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let mut artifact = test_artifact();

    artifact.compile(&device).unwrap();
    let first = artifact.handle(DeviceId(0)).unwrap();

    // Mutating bytecode must not trigger recompilation on the next call.
    artifact.bytecode.clear();
    artifact.compile(&device).unwrap();

    assert_eq!(mock.creates(), 1);
    assert_eq!(artifact.handle(DeviceId(0)), Some(first));
}

// ============================================================================
// Per-Device Independence
// ============================================================================

#[test]
fn two_devices_get_independent_handles() {
    let mock_a = MockDevice::new(1);
    let mock_b = MockDevice::new(2);
    let dev_a: Arc<dyn ComputeDevice> = mock_a.clone();
    let dev_b: Arc<dyn ComputeDevice> = mock_b.clone();
    let artifact = test_artifact();

    artifact.compile(&dev_a).unwrap();
    artifact.compile(&dev_b).unwrap();

    assert_eq!(mock_a.creates(), 1);
    assert_eq!(mock_b.creates(), 1);
    assert_eq!(artifact.handle_count(), 2);
    assert_ne!(
        artifact.handle(DeviceId(1)).unwrap(),
        artifact.handle(DeviceId(2)).unwrap()
    );
}

#[test]
fn failure_on_one_device_leaves_the_other_installed() {
    let mock_a = MockDevice::new(1);
    let mock_b = MockDevice::new(2);
    let dev_a: Arc<dyn ComputeDevice> = mock_a.clone();
    let dev_b: Arc<dyn ComputeDevice> = mock_b.clone();
    let artifact = test_artifact();

    artifact.compile(&dev_a).unwrap();
    mock_b.fail.store(true, Ordering::SeqCst);
    artifact.compile(&dev_b).unwrap_err();

    assert!(artifact.has_handle(DeviceId(1)));
    assert!(!artifact.has_handle(DeviceId(2)));
}

// ============================================================================
// Failure and Retry
// ============================================================================

#[test]
fn native_failure_carries_message_and_code() {
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let artifact = test_artifact();

    mock.fail.store(true, Ordering::SeqCst);
    let err = artifact.compile(&device).unwrap_err();

    match err {
        ShaderError::NativeCompile { message, code } => {
            assert_eq!(code, -4);
            assert!(message.contains("device lost"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failed_compile_can_be_retried() {
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let artifact = test_artifact();

    mock.fail.store(true, Ordering::SeqCst);
    artifact.compile(&device).unwrap_err();
    assert!(!artifact.has_handle(DeviceId(0)));

    mock.fail.store(false, Ordering::SeqCst);
    artifact.compile(&device).unwrap();
    assert!(artifact.has_handle(DeviceId(0)));
    assert_eq!(mock.creates(), 1);
}

#[test]
fn empty_bytecode_is_rejected_before_the_device_call() {
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let artifact = ShaderArtifact::new();

    let err = artifact.compile(&device).unwrap_err();
    assert!(matches!(err, ShaderError::MissingBytecode));
    assert_eq!(mock.creates(), 0);
}

// ============================================================================
// Release on Drop
// ============================================================================

#[test]
fn drop_releases_each_handle_once_via_its_device() {
    let mock_a = MockDevice::new(1);
    let mock_b = MockDevice::new(2);
    let dev_a: Arc<dyn ComputeDevice> = mock_a.clone();
    let dev_b: Arc<dyn ComputeDevice> = mock_b.clone();

    {
        let artifact = test_artifact();
        artifact.compile(&dev_a).unwrap();
        artifact.compile(&dev_b).unwrap();
        assert_eq!(mock_a.destroys(), 0);
        assert_eq!(mock_b.destroys(), 0);
    }

    assert_eq!(mock_a.destroys(), 1);
    assert_eq!(mock_b.destroys(), 1);
}

#[test]
fn drop_without_compiled_handles_destroys_nothing() {
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();

    {
        let artifact = test_artifact();
        mock.fail.store(true, Ordering::SeqCst);
        artifact.compile(&device).unwrap_err();
    }

    assert_eq!(mock.destroys(), 0);
}

#[test]
fn sibling_artifact_drop_leaves_shared_settings_and_handles_alone() {
    use prism_shader::ShaderCompileSettings;

    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let settings = Arc::new(ShaderCompileSettings::default());

    let mut survivor = test_artifact();
    survivor.settings = Some(Arc::clone(&settings));
    survivor.compile(&device).unwrap();

    {
        let mut sibling = test_artifact();
        sibling.settings = Some(Arc::clone(&settings));
        sibling.compile(&device).unwrap();
    }

    // The sibling released only its own handle; the shared settings record
    // and the survivor's handle are untouched.
    assert_eq!(mock.destroys(), 1);
    assert!(survivor.has_handle(DeviceId(0)));
    assert!(survivor.settings.is_some());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn racing_compiles_install_exactly_one_handle() {
    let mock = MockDevice::new(0);
    let device: Arc<dyn ComputeDevice> = mock.clone();
    let artifact = Arc::new(test_artifact());
    let barrier = Arc::new(Barrier::new(2));

    let threads: Vec<_> = (0..2)
        .map(|_| {
            let artifact = Arc::clone(&artifact);
            let device = Arc::clone(&device);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                artifact.compile(&device).unwrap();
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(mock.creates(), 1);
    assert_eq!(artifact.handle_count(), 1);
}
