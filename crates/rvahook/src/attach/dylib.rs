//! Native bridge backed by a dynamically loaded library.
//!
//! The library is expected to export:
//!
//! ```c
//! int rvahook_native_init(void);
//! int rvahook_native_update_targets(const uint64_t *targets, size_t len);
//! int rvahook_native_set_dump_mode(int enabled);   /* optional, skipped when absent */
//! ```
//!
//! A zero return code means success. When the library itself could not be
//! loaded, symbols are looked up in the already-loaded process image, so a
//! native layer brought in by other means is still reachable.

use std::ffi::{CString, c_int, c_void};

use tracing::debug;

use super::bridge::NativeBridge;
use crate::error::{Error, Result};

pub const INIT_SYMBOL: &str = "rvahook_native_init";
pub const UPDATE_TARGETS_SYMBOL: &str = "rvahook_native_update_targets";
pub const SET_DUMP_MODE_SYMBOL: &str = "rvahook_native_set_dump_mode";

type InitFn = unsafe extern "C" fn() -> c_int;
type UpdateTargetsFn = unsafe extern "C" fn(*const u64, usize) -> c_int;
type SetDumpModeFn = unsafe extern "C" fn(c_int) -> c_int;

/// Platform file name for a bare library name.
///
/// Names that already carry a path or an extension are used as given.
///
/// ```
/// use rvahook::attach::library_file_name;
///
/// assert_eq!(library_file_name("/opt/lib/libhook.so"), "/opt/lib/libhook.so");
/// if cfg!(target_os = "linux") {
///     assert_eq!(library_file_name("native_hook"), "libnative_hook.so");
/// }
/// ```
pub fn library_file_name(name: &str) -> String {
    if name.contains(['/', '\\', '.']) {
        return name.to_string();
    }
    format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        name,
        std::env::consts::DLL_SUFFIX
    )
}

/// Bridge that resolves the native entry points with the platform loader.
#[derive(Default)]
pub struct DylibBridge {
    library: Option<sys::Library>,
}

impl DylibBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    fn resolve(&self, name: &str) -> Result<*mut c_void> {
        let symbol = CString::new(name).map_err(|_| Error::SymbolNotFound(name.to_string()))?;
        self.library
            .as_ref()
            .and_then(|lib| lib.symbol(&symbol))
            .or_else(|| sys::process_symbol(&symbol))
            .ok_or_else(|| Error::SymbolNotFound(name.to_string()))
    }
}

fn check(call: &'static str, code: c_int) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(Error::NativeCallFailed { call, code })
    }
}

impl NativeBridge for DylibBridge {
    fn load_library(&mut self, name: &str) -> Result<()> {
        let file = library_file_name(name);
        let library = sys::Library::open(&file).map_err(|message| Error::LibraryLoadFailed {
            name: file.clone(),
            message,
        })?;
        debug!("Loaded {}", file);
        self.library = Some(library);
        Ok(())
    }

    fn init(&mut self) -> Result<()> {
        let ptr = self.resolve(INIT_SYMBOL)?;
        // SAFETY: resolved from the documented export
        unsafe { call_init(ptr) }
    }

    fn update_targets(&mut self, targets: &[u64]) -> Result<()> {
        let ptr = self.resolve(UPDATE_TARGETS_SYMBOL)?;
        // SAFETY: resolved from the documented export
        unsafe { call_update_targets(ptr, targets) }
    }

    fn set_dump_mode(&mut self, enabled: bool) -> Result<()> {
        let Ok(ptr) = self.resolve(SET_DUMP_MODE_SYMBOL) else {
            debug!("{} not exported, dump mode left to the native layer", SET_DUMP_MODE_SYMBOL);
            return Ok(());
        };
        // SAFETY: resolved from the documented export
        unsafe { call_set_dump_mode(ptr, enabled) }
    }
}

/// # Safety
/// `ptr` must point to a function with the `rvahook_native_init` signature.
unsafe fn call_init(ptr: *mut c_void) -> Result<()> {
    // SAFETY: guaranteed by the caller
    let code = unsafe {
        let init = std::mem::transmute::<*mut c_void, InitFn>(ptr);
        init()
    };
    check(INIT_SYMBOL, code)
}

/// # Safety
/// `ptr` must point to a function with the `rvahook_native_update_targets`
/// signature that only reads `len` values during the call.
unsafe fn call_update_targets(ptr: *mut c_void, targets: &[u64]) -> Result<()> {
    // SAFETY: guaranteed by the caller
    let code = unsafe {
        let update = std::mem::transmute::<*mut c_void, UpdateTargetsFn>(ptr);
        update(targets.as_ptr(), targets.len())
    };
    check(UPDATE_TARGETS_SYMBOL, code)
}

/// # Safety
/// `ptr` must point to a function with the `rvahook_native_set_dump_mode` signature.
unsafe fn call_set_dump_mode(ptr: *mut c_void, enabled: bool) -> Result<()> {
    // SAFETY: guaranteed by the caller
    let code = unsafe {
        let set = std::mem::transmute::<*mut c_void, SetDumpModeFn>(ptr);
        set(c_int::from(enabled))
    };
    check(SET_DUMP_MODE_SYMBOL, code)
}

// Library handles are never closed: interception installed by the native
// layer must stay valid for the rest of the process.
#[cfg(unix)]
mod sys {
    use std::ffi::{CStr, CString, c_void};

    pub struct Library(*mut c_void);

    impl Library {
        pub fn open(file: &str) -> Result<Self, String> {
            let path = CString::new(file).map_err(|e| e.to_string())?;
            // SAFETY: `path` is a valid C string for the duration of the call
            let handle = unsafe { libc::dlopen(path.as_ptr(), libc::RTLD_NOW | libc::RTLD_GLOBAL) };
            if handle.is_null() {
                Err(last_error())
            } else {
                Ok(Self(handle))
            }
        }

        pub fn symbol(&self, name: &CStr) -> Option<*mut c_void> {
            // SAFETY: the handle came from a successful dlopen
            let ptr = unsafe { libc::dlsym(self.0, name.as_ptr()) };
            (!ptr.is_null()).then_some(ptr)
        }
    }

    pub fn process_symbol(name: &CStr) -> Option<*mut c_void> {
        // SAFETY: RTLD_DEFAULT searches the global symbol scope
        let ptr = unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) };
        (!ptr.is_null()).then_some(ptr)
    }

    fn last_error() -> String {
        // SAFETY: dlerror returns null or a thread-local C string
        unsafe {
            let message = libc::dlerror();
            if message.is_null() {
                "unknown dlopen error".to_string()
            } else {
                CStr::from_ptr(message).to_string_lossy().into_owned()
            }
        }
    }
}

#[cfg(target_os = "windows")]
mod sys {
    use std::ffi::{CStr, c_void};

    use windows::Win32::Foundation::HMODULE;
    use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryW};
    use windows::core::{PCSTR, PCWSTR};

    pub struct Library(HMODULE);

    impl Library {
        pub fn open(file: &str) -> Result<Self, String> {
            let wide: Vec<u16> = file.encode_utf16().chain(std::iter::once(0)).collect();
            // SAFETY: `wide` is NUL-terminated and outlives the call
            unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) }
                .map(Self)
                .map_err(|e| e.to_string())
        }

        pub fn symbol(&self, name: &CStr) -> Option<*mut c_void> {
            lookup(self.0, name)
        }
    }

    pub fn process_symbol(name: &CStr) -> Option<*mut c_void> {
        // SAFETY: a null name yields the handle of the executable
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }.ok()?;
        lookup(module, name)
    }

    fn lookup(module: HMODULE, name: &CStr) -> Option<*mut c_void> {
        // SAFETY: `name` is NUL-terminated and `module` is a loaded module
        let proc = unsafe { GetProcAddress(module, PCSTR(name.as_ptr().cast())) }?;
        Some(proc as usize as *mut c_void)
    }
}

#[cfg(not(any(unix, target_os = "windows")))]
mod sys {
    use std::ffi::{CStr, c_void};

    pub struct Library;

    impl Library {
        pub fn open(_file: &str) -> Result<Self, String> {
            Err("dynamic loading is not supported on this platform".to_string())
        }

        pub fn symbol(&self, _name: &CStr) -> Option<*mut c_void> {
            None
        }
    }

    pub fn process_symbol(_name: &CStr) -> Option<*mut c_void> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    static RECEIVED: Mutex<Vec<u64>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record_targets(targets: *const u64, len: usize) -> c_int {
        // SAFETY: the caller passes a valid slice
        let slice = unsafe { std::slice::from_raw_parts(targets, len) };
        *RECEIVED.lock() = slice.to_vec();
        0
    }

    unsafe extern "C" fn failing_init() -> c_int {
        7
    }

    unsafe extern "C" fn accept_dump_mode(enabled: c_int) -> c_int {
        if enabled == 1 { 0 } else { 2 }
    }

    #[test]
    fn test_library_file_name_keeps_explicit_paths() {
        assert_eq!(library_file_name("./libfoo.so"), "./libfoo.so");
        assert_eq!(library_file_name("C:\\hooks\\foo.dll"), "C:\\hooks\\foo.dll");
        assert_eq!(library_file_name("foo.dylib"), "foo.dylib");
    }

    #[test]
    fn test_library_file_name_decorates_bare_names() {
        let file = library_file_name("native_hook");
        assert!(file.contains("native_hook"));
        assert!(file.ends_with(std::env::consts::DLL_SUFFIX));
    }

    #[test]
    fn test_missing_library_fails_independently() {
        let mut bridge = DylibBridge::new();
        let err = bridge
            .load_library("rvahook_definitely_missing_library")
            .unwrap_err();
        assert!(matches!(err, Error::LibraryLoadFailed { .. }));
        assert!(!bridge.is_loaded());

        // later calls are still attempted and report their own failure
        assert!(matches!(bridge.init(), Err(Error::SymbolNotFound(_))));
        assert!(matches!(
            bridge.update_targets(&[0x1000]),
            Err(Error::SymbolNotFound(_))
        ));
    }

    #[test]
    fn test_missing_dump_mode_symbol_is_skipped() {
        let mut bridge = DylibBridge::new();
        assert!(bridge.set_dump_mode(true).is_ok());
        assert!(bridge.set_dump_mode(false).is_ok());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_loads_system_library() {
        let mut bridge = DylibBridge::new();
        bridge.load_library("libc.so.6").unwrap();
        assert!(bridge.is_loaded());
        // libc exports none of the native entry points
        assert!(matches!(bridge.init(), Err(Error::SymbolNotFound(_))));
        assert!(bridge.set_dump_mode(true).is_ok());
    }

    #[test]
    fn test_update_targets_passes_full_slice() {
        let ptr = record_targets as *const () as *mut c_void;
        let targets = [0x1234, 0x123, 0x1d2_36e8];
        unsafe { call_update_targets(ptr, &targets) }.unwrap();
        assert_eq!(*RECEIVED.lock(), targets.to_vec());
    }

    #[test]
    fn test_non_zero_code_is_a_call_failure() {
        let ptr = failing_init as *const () as *mut c_void;
        let err = unsafe { call_init(ptr) }.unwrap_err();
        assert!(matches!(
            err,
            Error::NativeCallFailed {
                call: INIT_SYMBOL,
                code: 7
            }
        ));

        let ptr = accept_dump_mode as *const () as *mut c_void;
        assert!(unsafe { call_set_dump_mode(ptr, true) }.is_ok());
        assert!(matches!(
            unsafe { call_set_dump_mode(ptr, false) },
            Err(Error::NativeCallFailed { code: 2, .. })
        ));
    }
}
