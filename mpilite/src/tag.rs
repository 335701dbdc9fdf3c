//! Tag encoding.
//!
//! The upper 32 bits select the traffic class so that collective traffic
//! can never match a user receive; the lower 32 bits carry the user tag.

pub(crate) const USER_TAG: u32 = 0;
pub(crate) const BARRIER_TAG: u32 = 1;
pub(crate) const BCAST_TAG: u32 = 2;
pub(crate) const SCATTER_TAG: u32 = 3;
pub(crate) const GATHER_TAG: u32 = 4;

/// Encode the traffic class and user tag into the wire tag.
#[inline]
pub(crate) fn encode_tag(class: u32, tag: i32) -> u64 {
    ((class as u64) << 32) | (tag as u32 as u64)
}

/// Decode a wire tag into its (class, user tag) pair.
#[inline]
pub(crate) fn decode_tag(tag: u64) -> (u32, i32) {
    ((tag >> 32) as u32, tag as u32 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_do_not_collide() {
        assert_ne!(encode_tag(USER_TAG, 0), encode_tag(BARRIER_TAG, 0));
        assert_ne!(encode_tag(BCAST_TAG, 5), encode_tag(GATHER_TAG, 5));
    }

    #[test]
    fn negative_user_tags_survive() {
        assert_eq!(decode_tag(encode_tag(SCATTER_TAG, -3)), (SCATTER_TAG, -3));
    }
}
