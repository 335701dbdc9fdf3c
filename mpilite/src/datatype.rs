//! Element types that can be put on the wire.
use std::mem::size_of_val;

/// Plain element type that can be sent as a contiguous run of bytes.
///
/// # Safety
///
/// Implementors must have no padding, no pointers and accept every bit
/// pattern as a valid value, since received bytes are written straight into
/// the element storage.
pub unsafe trait Datatype: Copy + Send + Sync + 'static {
    /// View a slice of elements as raw bytes.
    fn as_bytes(data: &[Self]) -> &[u8] {
        unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, size_of_val(data)) }
    }

    /// View a mutable slice of elements as raw bytes.
    fn as_bytes_mut(data: &mut [Self]) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut u8, size_of_val(data)) }
    }
}

macro_rules! make_datatype {
    ($($type:ty),*) => {
        $(unsafe impl Datatype for $type {})*
    };
}

make_datatype!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_bytes_follow_native_layout() {
        let data = [1.5f32, -2.0];
        let bytes = f32::as_bytes(&data);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.5f32.to_ne_bytes());
        assert_eq!(&bytes[4..], &(-2.0f32).to_ne_bytes());
    }

    #[test]
    fn writes_through_byte_view() {
        let mut data = [0i32; 2];
        i32::as_bytes_mut(&mut data)[4..].copy_from_slice(&7i32.to_ne_bytes());
        assert_eq!(data, [0, 7]);
    }
}
