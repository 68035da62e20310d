//! Read-channel remapping for ATAC libraries
//!
//! CRAM files from ATAC libraries with a 24-cycle second index carry the
//! cell barcode in the I2 read. For delivery those files are relabeled:
//! I2 becomes R2 and the second biological read shifts to R3. Every other
//! library keeps the identity labeling. This is a fixed correction for one
//! assay/index-length pair, not a general remapping facility.

use crate::MetaRecord;

/// Case-insensitive substring identifying ATAC-style library types.
const ATAC_LIBRARY_MARKER: &str = "atac";

/// Second-index read length that triggers the correction.
const ATAC_I2_LENGTH: &str = "24";

/// Output labels for the four logical read channels of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMap {
    pub i1: &'static str,
    pub i2: &'static str,
    pub r1: &'static str,
    pub r2: &'static str,
}

const IDENTITY: ChannelMap = ChannelMap { i1: "I1", i2: "I2", r1: "R1", r2: "R2" };
const ATAC_CORRECTED: ChannelMap = ChannelMap { i1: "I1", i2: "R2", r1: "R1", r2: "R3" };

impl ChannelMap {
    pub fn is_identity(&self) -> bool {
        *self == IDENTITY
    }
}

/// Decide the output labeling for a file's read channels.
///
/// Total over all inputs: returns either the identity map or the fixed ATAC
/// correction, never a partial mapping.
pub fn channel_map(library_type: &str, i2len: &str) -> ChannelMap {
    if library_type.to_lowercase().contains(ATAC_LIBRARY_MARKER) && i2len == ATAC_I2_LENGTH {
        ATAC_CORRECTED
    } else {
        IDENTITY
    }
}

/// True when the record's library requires the ATAC channel correction.
pub fn requires_renaming(record: &MetaRecord) -> bool {
    !channel_map(record.get_or_na("library_type"), record.get_or_na("i2len")).is_identity()
}

/// Write the four output channel labels into the record as columns, so the
/// merged table documents how each file will be delivered.
pub fn annotate_channels(record: &mut MetaRecord) {
    let map = channel_map(record.get_or_na("library_type"), record.get_or_na("i2len"));
    record.insert("i1_out", map.i1);
    record.insert("i2_out", map.i2);
    record.insert("r1_out", map.r1);
    record.insert("r2_out", map.r2);
}
