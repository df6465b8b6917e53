//! C ABI over an opaque [`TrackComponent`] handle.
//!
//! Functions:
//! - `rt_track_new` / `rt_track_free` - create and destroy a track
//! - `rt_track_add_node`, `rt_track_insert_node`, `rt_track_move_node`,
//!   `rt_track_remove_node`, `rt_track_set_node_roll` - node edits
//! - `rt_track_set_closed`, `rt_track_set_linear_segment` - path shape
//! - `rt_track_rebuild` - bring frames up to date
//! - `rt_track_frame_count`, `rt_track_copy_frames`, `rt_track_frame_at_s`,
//!   `rt_track_total_length` - read results
//!
//! # Error Codes
//! - `0`: Success
//! - `-1`: Null pointer
//! - `-2`: Index out of range
//! - `-3`: Buffer too small (resize and retry)

use crate::curve::Node;
use crate::error::Result;
use crate::sim::Float3;
use crate::track::{Frame, TrackComponent, TrackConfig};

const OK: i32 = 0;
const NULL_POINTER: i32 = -1;
const OUT_OF_RANGE: i32 = -2;
const BUFFER_TOO_SMALL: i32 = -3;

/// Opaque handle to a track.
pub type RtTrackHandle = *mut std::ffi::c_void;

unsafe fn track_mut<'a>(handle: RtTrackHandle) -> Option<&'a mut TrackComponent> {
    (handle as *mut TrackComponent).as_mut()
}

unsafe fn track_ref<'a>(handle: RtTrackHandle) -> Option<&'a TrackComponent> {
    (handle as *const TrackComponent).as_ref()
}

fn status(result: Result<()>) -> i32 {
    match result {
        Ok(()) => OK,
        Err(_) => OUT_OF_RANGE,
    }
}

fn index_or_status(result: Result<usize>) -> i32 {
    match result {
        Ok(index) => i32::try_from(index).unwrap_or(OUT_OF_RANGE),
        Err(_) => OUT_OF_RANGE,
    }
}

/// Create an empty open track with frame spacing `ds`.
///
/// A non-positive `ds` falls back to the default spacing. Free the handle
/// with `rt_track_free`.
#[no_mangle]
pub extern "C" fn rt_track_new(ds: f32) -> RtTrackHandle {
    let config = TrackConfig {
        ds,
        ..TrackConfig::default()
    };
    Box::into_raw(Box::new(TrackComponent::with_config(config))) as RtTrackHandle
}

/// Free a track handle.
///
/// # Safety
/// - `handle` must be a handle returned by `rt_track_new`, or null
/// - `handle` must not be used afterwards
#[no_mangle]
pub unsafe extern "C" fn rt_track_free(handle: RtTrackHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut TrackComponent));
    }
}

/// Append a node.
///
/// # Returns
/// - The new node's index (>= 0) on success
/// - `-1` on null handle
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_add_node(
    handle: RtTrackHandle,
    position: Float3,
    roll: f32,
) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    let index = track.add_node(Node::with_roll(position, roll));
    i32::try_from(index).unwrap_or(OUT_OF_RANGE)
}

/// Insert a node before `index`; `index == node count` appends.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_insert_node(
    handle: RtTrackHandle,
    index: usize,
    position: Float3,
    roll: f32,
) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    status(track.insert_node(index, Node::with_roll(position, roll)))
}

/// Insert a node after `after` (`-1` for the front), inheriting the
/// neighbour's roll.
///
/// # Returns
/// - The new node's index (>= 0) on success
/// - `-1` on null handle, `-2` if `after` is out of range
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_insert_node_after(
    handle: RtTrackHandle,
    after: i32,
    position: Float3,
) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    let after = match after {
        -1 => None,
        i if i >= 0 => Some(i as usize),
        _ => return OUT_OF_RANGE,
    };
    index_or_status(track.insert_node_after(after, position, None))
}

/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_move_node(
    handle: RtTrackHandle,
    index: usize,
    position: Float3,
) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    status(track.move_node(index, position))
}

/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_remove_node(handle: RtTrackHandle, index: usize) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    status(track.remove_node(index).map(drop))
}

/// Set a node's roll in radians.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_set_node_roll(
    handle: RtTrackHandle,
    index: usize,
    roll: f32,
) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    status(track.set_node_roll(index, roll))
}

/// Open (`0`) or close (non-zero) the loop.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_set_closed(handle: RtTrackHandle, closed: u8) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    track.set_closed(closed != 0);
    OK
}

/// Make segment `segment` a straight line between its anchor nodes.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_set_linear_segment(
    handle: RtTrackHandle,
    segment: usize,
) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    status(track.set_linear_by_segment(segment))
}

/// Rebuild whatever the edits since the last rebuild invalidated.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_rebuild(handle: RtTrackHandle) -> i32 {
    let Some(track) = track_mut(handle) else {
        return NULL_POINTER;
    };
    track.rebuild();
    OK
}

/// Number of frames from the last rebuild, or `-1` on null handle.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
#[no_mangle]
pub unsafe extern "C" fn rt_track_frame_count(handle: RtTrackHandle) -> i64 {
    match track_ref(handle) {
        Some(track) => track.frames().len() as i64,
        None => NULL_POINTER as i64,
    }
}

/// Copy the frames into `buffer`.
///
/// # Returns
/// - `0` on success
/// - `-1` on null pointer
/// - `-3` if the buffer is too small (`frames_written` holds the required count)
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
/// - `buffer` must point to at least `capacity` writable `Frame`s
/// - `frames_written` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn rt_track_copy_frames(
    handle: RtTrackHandle,
    buffer: *mut Frame,
    capacity: usize,
    frames_written: *mut usize,
) -> i32 {
    if buffer.is_null() || frames_written.is_null() {
        return NULL_POINTER;
    }
    let Some(track) = track_ref(handle) else {
        return NULL_POINTER;
    };

    let frames = track.frames();
    *frames_written = frames.len();
    if frames.len() > capacity {
        return BUFFER_TOO_SMALL;
    }
    std::ptr::copy_nonoverlapping(frames.as_ptr(), buffer, frames.len());
    OK
}

/// Interpolated frame at arc length `s`.
///
/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
/// - `out` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn rt_track_frame_at_s(
    handle: RtTrackHandle,
    s: f32,
    out: *mut Frame,
) -> i32 {
    if out.is_null() {
        return NULL_POINTER;
    }
    let Some(track) = track_ref(handle) else {
        return NULL_POINTER;
    };
    *out = track.frame_at_s(s);
    OK
}

/// # Safety
/// - `handle` must be a valid handle from `rt_track_new`, or null
/// - `out` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn rt_track_total_length(handle: RtTrackHandle, out: *mut f32) -> i32 {
    if out.is_null() {
        return NULL_POINTER;
    }
    let Some(track) = track_ref(handle) else {
        return NULL_POINTER;
    };
    *out = track.total_length();
    OK
}
