/*!
 * Addon archive handling.
 *
 * Bedrock addons (`.mcaddon`, `.mcpack`) are plain zip containers. This module
 * reads them without extracting anything to disk and writes the translated
 * copy back out:
 * - `structures`: on-disk record layouts
 * - `reader`: central directory parsing and lazy entry decoding
 * - `writer`: in-memory archive builder
 * - `overlay`: repackaging with translated entries laid over the original
 */

pub mod overlay;
pub mod reader;
pub mod structures;
pub mod writer;

pub use overlay::{build_output_archive, localization_target_path};
pub use reader::ArchiveHandle;
pub use structures::{ArchiveEntry, CompressionMethod};
pub use writer::ArchiveWriter;
