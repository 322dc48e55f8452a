//! Device transport — traits + Linux evdev backend.
//!
//! [`Backend`] lists candidate nodes and opens them; [`FfHandle`] is one
//! open node. Everything above this module talks to these traits only, so
//! the registry and playback logic run unchanged against the in-memory
//! [`mock`] backend.

use std::io;
use std::path::{Path, PathBuf};

use crate::codec::RawEffect;
use crate::device::Result;
use crate::features::FeatureSet;
use crate::protocol::*;

// ── Events ──

/// One `EV_FF` input event (`type` is always `EV_FF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfEvent {
    pub code: u16,
    pub value: i32,
}

impl FfEvent {
    /// Start playback of an uploaded effect.
    pub fn play(id: i16) -> Self {
        FfEvent {
            code: id as u16,
            value: FF_STATUS_PLAYING,
        }
    }

    /// Stop playback of an uploaded effect.
    pub fn stop(id: i16) -> Self {
        FfEvent {
            code: id as u16,
            value: FF_STATUS_STOPPED,
        }
    }

    /// Device gain, already scaled to `0..=0xFFFF`.
    pub fn gain(level: i32) -> Self {
        FfEvent {
            code: FF_GAIN,
            value: level,
        }
    }

    /// Autocenter strength, already scaled to `0..=0xFFFF`.
    pub fn autocenter(level: i32) -> Self {
        FfEvent {
            code: FF_AUTOCENTER,
            value: level,
        }
    }
}

// ── Traits ──

/// An open force-feedback node. Dropping the handle closes it.
pub trait FfHandle {
    /// `EVIOCGBIT(EV_FF)`: supported force-feedback codes.
    fn query_features(&self) -> Result<FeatureSet>;
    /// `EVIOCGEFFECTS`: number of effects the device can hold at once.
    fn query_capacity(&self) -> Result<i32>;
    /// `EVIOCGNAME`: device name, possibly empty.
    fn query_name(&self) -> Result<String>;
    /// `EVIOCSFF`: upload or update an effect. On success `raw.id` holds
    /// the slot the kernel used.
    fn upload(&self, raw: &mut RawEffect) -> Result<()>;
    /// `EVIOCRMFF`: free an effect slot.
    fn remove(&self, id: i16) -> Result<()>;
    /// Write one `EV_FF` event. A short write is an error.
    fn write_event(&self, event: FfEvent) -> Result<()>;
}

/// Source of force-feedback nodes.
pub trait Backend {
    type Handle: FfHandle;

    /// Candidate node paths in `dir` whose file name starts with `prefix`,
    /// sorted by file name.
    fn list_nodes(&self, dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>>;

    /// Open a node read-write.
    fn open(&self, path: &Path) -> Result<Self::Handle>;
}

/// List `dir` entries whose file name starts with `prefix`, in byte order.
pub fn scan_nodes(dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
    let mut nodes = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.as_encoded_bytes().starts_with(prefix.as_bytes()) {
            nodes.push(entry.path());
        }
    }
    nodes.sort_by(|a, b| {
        let a = a.file_name().map(|n| n.as_encoded_bytes()).unwrap_or_default();
        let b = b.file_name().map(|n| n.as_encoded_bytes()).unwrap_or_default();
        a.cmp(b)
    });
    Ok(nodes)
}

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::mem;
    use std::os::fd::AsRawFd;

    use crate::codec::RawPayload;
    use crate::device::{DeviceError, parse_device_name};

    /// Kernel ABI structs from `<linux/input.h>`.
    #[allow(non_camel_case_types)]
    mod sys {
        use crate::protocol::*;

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_trigger {
            pub button: u16,
            pub interval: u16,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_replay {
            pub length: u16,
            pub delay: u16,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_envelope {
            pub attack_length: u16,
            pub attack_level: u16,
            pub fade_length: u16,
            pub fade_level: u16,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_constant_effect {
            pub level: i16,
            pub envelope: ff_envelope,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_ramp_effect {
            pub start_level: i16,
            pub end_level: i16,
            pub envelope: ff_envelope,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_condition_effect {
            pub right_saturation: u16,
            pub left_saturation: u16,
            pub right_coeff: i16,
            pub left_coeff: i16,
            pub deadband: u16,
            pub center: i16,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_periodic_effect {
            pub waveform: u16,
            pub period: u16,
            pub magnitude: i16,
            pub offset: i16,
            pub phase: u16,
            pub envelope: ff_envelope,
            pub custom_len: u32,
            pub custom_data: *mut i16,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_rumble_effect {
            pub strong_magnitude: u16,
            pub weak_magnitude: u16,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub union ff_effect_params {
            pub constant: ff_constant_effect,
            pub ramp: ff_ramp_effect,
            pub periodic: ff_periodic_effect,
            pub condition: [ff_condition_effect; 2],
            pub rumble: ff_rumble_effect,
        }

        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct ff_effect {
            pub type_: u16,
            pub id: i16,
            pub direction: u16,
            pub trigger: ff_trigger,
            pub replay: ff_replay,
            pub u: ff_effect_params,
        }

        /// `struct input_event`.
        #[repr(C)]
        pub struct input_event {
            pub time: libc::timeval,
            pub type_: u16,
            pub code: u16,
            pub value: i32,
        }

        nix::ioctl_read_buf!(eviocgname, EVDEV_IOC_MAGIC, EVIOCGNAME_NR, u8);
        nix::ioctl_read_buf!(
            eviocgbit_ff,
            EVDEV_IOC_MAGIC,
            EVIOCGBIT_NR + EV_FF as u8,
            libc::c_ulong
        );
        nix::ioctl_read!(eviocgeffects, EVDEV_IOC_MAGIC, EVIOCGEFFECTS_NR, libc::c_int);
        // EVIOCSFF is declared _IOW but the kernel writes the slot id back.
        nix::ioctl_readwrite_bad!(
            eviocsff,
            nix::request_code_write!(
                EVDEV_IOC_MAGIC,
                EVIOCSFF_NR,
                std::mem::size_of::<ff_effect>()
            ),
            ff_effect
        );
        nix::ioctl_write_int_bad!(
            eviocrmff,
            nix::request_code_write!(
                EVDEV_IOC_MAGIC,
                EVIOCRMFF_NR,
                std::mem::size_of::<libc::c_int>()
            )
        );
    }

    fn envelope(e: crate::codec::RawEnvelope) -> sys::ff_envelope {
        sys::ff_envelope {
            attack_length: e.attack_length,
            attack_level: e.attack_level,
            fade_length: e.fade_length,
            fade_level: e.fade_level,
        }
    }

    /// Lay a [`RawEffect`] out as the kernel's `struct ff_effect`.
    fn to_sys(raw: &RawEffect) -> sys::ff_effect {
        // SAFETY: ff_effect is plain old data; all-zero is a valid value
        // (null custom_data, zero lengths) and clears the unused union bytes.
        let mut eff: sys::ff_effect = unsafe { mem::zeroed() };
        eff.type_ = raw.effect_type;
        eff.id = raw.id;
        eff.direction = raw.direction;
        eff.trigger = sys::ff_trigger {
            button: raw.trigger.button,
            interval: raw.trigger.interval,
        };
        eff.replay = sys::ff_replay {
            length: raw.replay.length,
            delay: raw.replay.delay,
        };
        match raw.payload {
            RawPayload::Rumble {
                strong_magnitude,
                weak_magnitude,
            } => {
                eff.u.rumble = sys::ff_rumble_effect {
                    strong_magnitude,
                    weak_magnitude,
                }
            }
            RawPayload::Periodic {
                waveform,
                period,
                magnitude,
                offset,
                phase,
                envelope: env,
            } => {
                eff.u.periodic = sys::ff_periodic_effect {
                    waveform,
                    period,
                    magnitude,
                    offset,
                    phase,
                    envelope: envelope(env),
                    custom_len: 0,
                    custom_data: std::ptr::null_mut(),
                }
            }
            RawPayload::Constant {
                level,
                envelope: env,
            } => {
                eff.u.constant = sys::ff_constant_effect {
                    level,
                    envelope: envelope(env),
                }
            }
            RawPayload::Ramp {
                start_level,
                end_level,
                envelope: env,
            } => {
                eff.u.ramp = sys::ff_ramp_effect {
                    start_level,
                    end_level,
                    envelope: envelope(env),
                }
            }
        }
        eff
    }

    /// Opens `/dev/input/event*` nodes as plain files.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct EvdevBackend;

    pub struct EvdevHandle {
        file: File,
    }

    impl Backend for EvdevBackend {
        type Handle = EvdevHandle;

        fn list_nodes(&self, dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
            scan_nodes(dir, prefix)
        }

        fn open(&self, path: &Path) -> Result<EvdevHandle> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|e| DeviceError::OpenFailed(format!("{}: {e}", path.display())))?;
            Ok(EvdevHandle { file })
        }
    }

    impl FfHandle for EvdevHandle {
        fn query_features(&self) -> Result<FeatureSet> {
            let mut words = [0 as libc::c_ulong; FF_CNT / libc::c_ulong::BITS as usize];
            // SAFETY: fd is open for the lifetime of self; the buffer length
            // is passed to the kernel through the request code.
            unsafe { sys::eviocgbit_ff(self.file.as_raw_fd(), &mut words) }
                .map_err(|e| DeviceError::QueryFailed(format!("EVIOCGBIT(EV_FF): {e}")))?;
            let words: Vec<u64> = words.iter().map(|&w| u64::from(w)).collect();
            Ok(FeatureSet::from_words(&words, libc::c_ulong::BITS))
        }

        fn query_capacity(&self) -> Result<i32> {
            let mut n: libc::c_int = 0;
            // SAFETY: fd is open; n is a valid c_int out-parameter.
            unsafe { sys::eviocgeffects(self.file.as_raw_fd(), &mut n) }
                .map_err(|e| DeviceError::QueryFailed(format!("EVIOCGEFFECTS: {e}")))?;
            Ok(n)
        }

        fn query_name(&self) -> Result<String> {
            let mut buf = [0u8; NAME_MAX_LEN];
            // SAFETY: fd is open; the kernel writes at most buf.len() bytes.
            unsafe { sys::eviocgname(self.file.as_raw_fd(), &mut buf) }
                .map_err(|e| DeviceError::QueryFailed(format!("EVIOCGNAME: {e}")))?;
            Ok(parse_device_name(&buf))
        }

        fn upload(&self, raw: &mut RawEffect) -> Result<()> {
            let mut eff = to_sys(raw);
            // SAFETY: fd is open; eff is a fully initialized ff_effect that
            // outlives the call. custom_data is null with custom_len 0.
            unsafe { sys::eviocsff(self.file.as_raw_fd(), &mut eff) }
                .map_err(|e| DeviceError::TransactFailed(format!("EVIOCSFF: {e}")))?;
            raw.id = eff.id;
            Ok(())
        }

        fn remove(&self, id: i16) -> Result<()> {
            // SAFETY: fd is open; EVIOCRMFF takes the slot id by value.
            unsafe { sys::eviocrmff(self.file.as_raw_fd(), libc::c_int::from(id)) }
                .map_err(|e| DeviceError::TransactFailed(format!("EVIOCRMFF: {e}")))?;
            Ok(())
        }

        fn write_event(&self, event: FfEvent) -> Result<()> {
            let ev = sys::input_event {
                time: libc::timeval {
                    tv_sec: 0,
                    tv_usec: 0,
                },
                type_: EV_FF,
                code: event.code,
                value: event.value,
            };
            let len = mem::size_of::<sys::input_event>();
            // SAFETY: input_event is repr(C) without padding; the slice
            // covers exactly the struct and lives no longer than `ev`.
            let bytes =
                unsafe { std::slice::from_raw_parts(&ev as *const _ as *const u8, len) };
            let n = (&self.file)
                .write(bytes)
                .map_err(|e| DeviceError::TransactFailed(format!("write: {e}")))?;
            if n != len {
                return Err(DeviceError::TransactFailed(format!(
                    "write: short write ({n} of {len} bytes)"
                )));
            }
            Ok(())
        }
    }

}

#[cfg(target_os = "linux")]
pub use linux_impl::{EvdevBackend, EvdevHandle};

// ── Stub backend for unsupported platforms ──

/// Backend for hosts without evdev. Listing fails with `Unsupported`.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StubBackend;

/// Uninhabited: [`StubBackend`] never opens anything.
#[cfg(not(target_os = "linux"))]
pub enum StubHandle {}

#[cfg(not(target_os = "linux"))]
impl Backend for StubBackend {
    type Handle = StubHandle;

    fn list_nodes(&self, _dir: &Path, _prefix: &str) -> io::Result<Vec<PathBuf>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "evdev force feedback requires Linux",
        ))
    }

    fn open(&self, path: &Path) -> Result<StubHandle> {
        Err(crate::device::DeviceError::OpenFailed(format!(
            "{}: evdev force feedback requires Linux",
            path.display()
        )))
    }
}

#[cfg(not(target_os = "linux"))]
impl FfHandle for StubHandle {
    fn query_features(&self) -> Result<FeatureSet> {
        match *self {}
    }
    fn query_capacity(&self) -> Result<i32> {
        match *self {}
    }
    fn query_name(&self) -> Result<String> {
        match *self {}
    }
    fn upload(&self, _raw: &mut RawEffect) -> Result<()> {
        match *self {}
    }
    fn remove(&self, _id: i16) -> Result<()> {
        match *self {}
    }
    fn write_event(&self, _event: FfEvent) -> Result<()> {
        match *self {}
    }
}

/// Concrete backend for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformBackend = EvdevBackend;
#[cfg(not(target_os = "linux"))]
pub type PlatformBackend = StubBackend;

// ── Mock backend for testing ──

/// In-memory backend for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::device::DeviceError;

    /// One recorded transport call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Open(PathBuf),
        QueryFeatures,
        QueryCapacity,
        QueryName,
        /// The record as submitted, before the slot write-back.
        Upload(RawEffect),
        Remove(i16),
        Event(FfEvent),
        Close(PathBuf),
    }

    impl Call {
        /// Open/close bookkeeping rather than a request on an open node.
        pub fn is_lifecycle(&self) -> bool {
            matches!(self, Call::Open(_) | Call::Close(_))
        }
    }

    /// Behaviour of one fake node. `None` makes the matching query fail.
    #[derive(Debug, Clone)]
    pub struct MockNode {
        pub features: Option<FeatureSet>,
        pub capacity: Option<i32>,
        pub name: Option<String>,
        pub fail_open: bool,
        pub fail_upload: bool,
        pub short_write: bool,
    }

    impl MockNode {
        /// A gamepad with rumble, periodic sine, gain and 16 slots.
        pub fn gamepad(name: &str) -> Self {
            MockNode {
                features: Some(
                    FeatureSet::RUMBLE
                        | FeatureSet::PERIODIC
                        | FeatureSet::SINE
                        | FeatureSet::GAIN,
                ),
                capacity: Some(16),
                name: Some(name.into()),
                fail_open: false,
                fail_upload: false,
                short_write: false,
            }
        }

        /// A node with no force-feedback support at all (e.g. a keyboard).
        pub fn plain(name: &str) -> Self {
            MockNode {
                features: Some(FeatureSet::empty()),
                capacity: Some(0),
                ..MockNode::gamepad(name)
            }
        }
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    pub struct MockBackend {
        dir: PathBuf,
        nodes: Vec<(PathBuf, MockNode)>,
        calls: Log,
        next_slot: Rc<Cell<i16>>,
    }

    impl MockBackend {
        /// An empty fake directory at `dir`; listing any other dir fails.
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            MockBackend {
                dir: dir.into(),
                nodes: Vec::new(),
                calls: Rc::new(RefCell::new(Vec::new())),
                next_slot: Rc::new(Cell::new(0)),
            }
        }

        /// Add a node named `file_name` inside the fake directory.
        pub fn with_node(mut self, file_name: &str, node: MockNode) -> Self {
            self.nodes.push((self.dir.join(file_name), node));
            self
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        /// Every call recorded so far.
        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        /// Recorded calls excluding open/close.
        pub fn requests(&self) -> Vec<Call> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| !c.is_lifecycle())
                .cloned()
                .collect()
        }

        pub fn clear_calls(&self) {
            self.calls.borrow_mut().clear();
        }

        /// Number of handles currently open.
        pub fn open_handles(&self) -> usize {
            let calls = self.calls.borrow();
            let opens = calls.iter().filter(|c| matches!(c, Call::Open(_))).count();
            let closes = calls.iter().filter(|c| matches!(c, Call::Close(_))).count();
            opens - closes
        }
    }

    impl Backend for MockBackend {
        type Handle = MockHandle;

        fn list_nodes(&self, dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
            if dir != self.dir {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{}: no such directory", dir.display()),
                ));
            }
            let mut paths: Vec<PathBuf> = self
                .nodes
                .iter()
                .map(|(p, _)| p.clone())
                .filter(|p| {
                    p.file_name()
                        .is_some_and(|n| n.as_encoded_bytes().starts_with(prefix.as_bytes()))
                })
                .collect();
            paths.sort();
            Ok(paths)
        }

        fn open(&self, path: &Path) -> Result<MockHandle> {
            let node = self
                .nodes
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, n)| n.clone())
                .ok_or_else(|| {
                    DeviceError::OpenFailed(format!("{}: No such file", path.display()))
                })?;
            if node.fail_open {
                return Err(DeviceError::OpenFailed(format!(
                    "{}: Permission denied",
                    path.display()
                )));
            }
            self.calls.borrow_mut().push(Call::Open(path.to_path_buf()));
            Ok(MockHandle {
                path: path.to_path_buf(),
                node,
                calls: Rc::clone(&self.calls),
                next_slot: Rc::clone(&self.next_slot),
            })
        }
    }

    pub struct MockHandle {
        path: PathBuf,
        node: MockNode,
        calls: Log,
        next_slot: Rc<Cell<i16>>,
    }

    impl MockHandle {
        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl FfHandle for MockHandle {
        fn query_features(&self) -> Result<FeatureSet> {
            self.record(Call::QueryFeatures);
            self.node
                .features
                .ok_or_else(|| DeviceError::QueryFailed("EVIOCGBIT(EV_FF): mock failure".into()))
        }

        fn query_capacity(&self) -> Result<i32> {
            self.record(Call::QueryCapacity);
            self.node
                .capacity
                .ok_or_else(|| DeviceError::QueryFailed("EVIOCGEFFECTS: mock failure".into()))
        }

        fn query_name(&self) -> Result<String> {
            self.record(Call::QueryName);
            self.node
                .name
                .clone()
                .ok_or_else(|| DeviceError::QueryFailed("EVIOCGNAME: mock failure".into()))
        }

        fn upload(&self, raw: &mut RawEffect) -> Result<()> {
            self.record(Call::Upload(*raw));
            if self.node.fail_upload {
                return Err(DeviceError::TransactFailed(
                    "EVIOCSFF: mock rejection".into(),
                ));
            }
            if raw.id < 0 {
                raw.id = self.next_slot.get();
                self.next_slot.set(raw.id + 1);
            }
            Ok(())
        }

        fn remove(&self, id: i16) -> Result<()> {
            self.record(Call::Remove(id));
            Ok(())
        }

        fn write_event(&self, event: FfEvent) -> Result<()> {
            self.record(Call::Event(event));
            if self.node.short_write {
                return Err(DeviceError::TransactFailed(
                    "write: short write (0 of 24 bytes)".into(),
                ));
            }
            Ok(())
        }
    }

    impl Drop for MockHandle {
        fn drop(&mut self) {
            self.calls.borrow_mut().push(Call::Close(self.path.clone()));
        }
    }
}
