use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::torrent::Info;

/// A single correspondence between a section of a piece and an equally sized
/// section of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// Index of the piece.
    pub piece: usize,
    /// Byte range covered within the piece.
    pub piece_range: Range<u64>,
    /// Path of the file, relative to the torrent's base directory.
    pub file: PathBuf,
    /// Byte range covered within the file. Always the same length as
    /// `piece_range`.
    pub file_range: Range<u64>,
}

/// The bidirectional mapping between a torrent's pieces and its files.
///
/// Built by sweeping the files in order and laying them into fixed-size
/// pieces. Every byte of every piece and every byte of every file is covered
/// by exactly one entry.
///
/// Entries are stored once; the per-piece and per-file views are indices
/// into the shared list.
///
/// # Examples
///
/// ```no_run
/// use bitwire::metainfo::Metainfo;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let metainfo = Metainfo::from_file("example.torrent")?;
/// let mapping = metainfo.info.mapping();
///
/// for entry in mapping.for_piece(0) {
///     println!("piece 0 [{:?}] -> {:?} [{:?}]",
///         entry.piece_range, entry.file, entry.file_range);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PieceFileMapping {
    entries: Vec<MappingEntry>,
    by_piece: Vec<Vec<usize>>,
    by_file: HashMap<PathBuf, Vec<usize>>,
    files: Vec<PathBuf>,
}

impl PieceFileMapping {
    pub(crate) fn for_info(info: &Info) -> Self {
        let piece_size = info.piece_length;

        let mut entries = Vec::new();
        let mut by_piece: Vec<Vec<usize>> = Vec::new();
        let mut by_file = HashMap::new();
        let mut files = Vec::with_capacity(info.files.len());

        let mut piece = 0usize;
        let mut piece_pos = 0u64;

        for file in &info.files {
            let mut file_entries = Vec::new();
            let mut file_pos = 0u64;
            let mut remaining = file.length;

            while remaining > 0 {
                let take = remaining.min(piece_size - piece_pos);

                let idx = entries.len();
                entries.push(MappingEntry {
                    piece,
                    piece_range: piece_pos..piece_pos + take,
                    file: file.path.clone(),
                    file_range: file_pos..file_pos + take,
                });
                file_entries.push(idx);
                if by_piece.len() == piece {
                    by_piece.push(Vec::new());
                }
                by_piece[piece].push(idx);

                piece_pos += take;
                file_pos += take;
                remaining -= take;

                if piece_pos == piece_size {
                    piece += 1;
                    piece_pos = 0;
                }
            }

            files.push(file.path.clone());
            by_file.insert(file.path.clone(), file_entries);
        }

        Self {
            entries,
            by_piece,
            by_file,
            files,
        }
    }

    /// Returns the number of pieces covered by the mapping.
    pub fn piece_count(&self) -> usize {
        self.by_piece.len()
    }

    /// Returns every entry, in sweep order.
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Returns the files covered by the mapping, in torrent order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Returns the entries that cover the piece at `piece`, in order.
    ///
    /// Their piece ranges union to the full length of that piece. Unknown
    /// indices yield an empty vector.
    pub fn for_piece(&self, piece: usize) -> Vec<&MappingEntry> {
        self.by_piece
            .get(piece)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Returns the entries that cover `file`, in order.
    ///
    /// Their file ranges union to the full length of that file. Unknown
    /// paths yield an empty vector.
    pub fn for_file(&self, file: &Path) -> Vec<&MappingEntry> {
        self.by_file
            .get(file)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }
}
