use std::path::{Path, PathBuf};

use super::error::MetainfoError;
use super::info_hash::InfoHash;
use super::mapping::PieceFileMapping;
use crate::bencode::{decode, Value};

/// A parsed torrent file.
///
/// Contains all metadata from a `.torrent` file: the info dictionary, the
/// tracker URLs, and the optional descriptive fields.
///
/// # Examples
///
/// ```no_run
/// use bitwire::metainfo::Metainfo;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let metainfo = Metainfo::from_file("example.torrent")?;
///
/// println!("Torrent: {}", metainfo.info.name);
/// println!("Size: {} bytes", metainfo.info.total_length);
/// println!("Info hash: {}", metainfo.info_hash);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Metainfo {
    /// The info dictionary containing file and piece information.
    pub info: Info,
    /// SHA-1 of the canonical encoding of the info dictionary.
    pub info_hash: InfoHash,
    /// Primary tracker URL.
    pub announce: String,
    /// Multi-tier tracker list ([BEP-12](http://bittorrent.org/beps/bep_0012.html)).
    /// Each inner list is one tier, tried in order.
    pub announce_list: Vec<Vec<String>>,
    /// Unix timestamp when the torrent was created.
    pub creation_date: Option<i64>,
    /// Optional comment about the torrent.
    pub comment: Option<String>,
    /// Name/version of the program that created the torrent.
    pub created_by: Option<String>,
}

/// The info dictionary from a torrent file.
///
/// The SHA-1 hash of this dictionary in its canonical bencode form is the
/// torrent's info hash.
#[derive(Debug, Clone)]
pub struct Info {
    /// Suggested name for the file or directory.
    pub name: String,
    /// Number of bytes per piece (the last piece may be shorter).
    pub piece_length: u64,
    /// SHA-1 hash of each piece.
    pub pieces: Vec<[u8; 20]>,
    /// If true, clients should only use trackers in the metainfo.
    pub private: bool,
    /// Advised base directory: `"."` for single-file torrents, the torrent
    /// name for multi-file torrents.
    pub base_dir: String,
    /// Files in the torrent, in piece order.
    pub files: Vec<FileEntry>,
    /// Total size of all files combined.
    pub total_length: u64,
}

/// A file within a torrent.
///
/// Paths are relative to the torrent's base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file, relative to the base directory.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub length: u64,
    /// Byte offset of this file within the torrent's concatenated content.
    pub offset: u64,
}

impl Metainfo {
    /// Parses a torrent file from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not canonical bencode, if a required
    /// field is missing or has the wrong type, if `piece length` is not
    /// positive, or if the `pieces` string is not a multiple of 20 bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let value = decode(data)?;
        Self::from_value(&value)
    }

    /// Parses a torrent from an already decoded bencode value.
    pub fn from_value(value: &Value) -> Result<Self, MetainfoError> {
        let dict = value.as_dict().ok_or(MetainfoError::InvalidField("root"))?;

        let announce = dict
            .get(b"announce".as_slice())
            .ok_or(MetainfoError::MissingField("announce"))?
            .as_str()
            .ok_or(MetainfoError::InvalidField("announce"))?
            .to_string();

        let info_value = dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;

        // The decoder only accepts canonical input, so re-encoding the info
        // subtree reproduces its original bytes and the hash is stable.
        let info_hash = InfoHash::of_value(info_value)?;
        let info = Info::from_value(info_value)?;

        let announce_list = match dict.get(b"announce-list".as_slice()) {
            None => Vec::new(),
            Some(v) => {
                let tiers = v
                    .as_list()
                    .ok_or(MetainfoError::InvalidField("announce-list"))?;
                tiers
                    .iter()
                    .map(|tier| {
                        let urls = tier
                            .as_list()
                            .ok_or(MetainfoError::InvalidField("announce-list"))?;
                        urls.iter()
                            .map(|u| {
                                u.as_str()
                                    .map(String::from)
                                    .ok_or(MetainfoError::InvalidField("announce-list"))
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let creation_date = dict
            .get(b"creation date".as_slice())
            .and_then(|v| v.as_integer());

        let comment = dict
            .get(b"comment".as_slice())
            .and_then(|v| v.as_str())
            .map(String::from);

        let created_by = dict
            .get(b"created by".as_slice())
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(Self {
            info,
            info_hash,
            announce,
            announce_list,
            creation_date,
            comment,
            created_by,
        })
    }

    /// Reads and parses a torrent file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetainfoError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Returns all tracker URLs, the primary first, without duplicates.
    pub fn trackers(&self) -> Vec<String> {
        let mut trackers = vec![self.announce.clone()];

        for tier in &self.announce_list {
            for tracker in tier {
                if !trackers.contains(tracker) {
                    trackers.push(tracker.clone());
                }
            }
        }

        trackers
    }
}

impl Info {
    pub(crate) fn from_value(value: &Value) -> Result<Self, MetainfoError> {
        let dict = value.as_dict().ok_or(MetainfoError::InvalidField("info"))?;

        let name = dict
            .get(b"name".as_slice())
            .and_then(|v| v.as_str())
            .ok_or(MetainfoError::MissingField("name"))?
            .to_string();

        let piece_length = dict
            .get(b"piece length".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or(MetainfoError::MissingField("piece length"))?;

        if piece_length <= 0 {
            return Err(MetainfoError::InvalidField("piece length"));
        }
        let piece_length = piece_length as u64;

        let pieces_bytes = dict
            .get(b"pieces".as_slice())
            .and_then(|v| v.as_bytes())
            .ok_or(MetainfoError::MissingField("pieces"))?;

        if pieces_bytes.len() % 20 != 0 {
            return Err(MetainfoError::InvalidField("pieces"));
        }

        let pieces: Vec<[u8; 20]> = pieces_bytes
            .chunks_exact(20)
            .map(|chunk| {
                let mut arr = [0u8; 20];
                arr.copy_from_slice(chunk);
                arr
            })
            .collect();

        let private = dict
            .get(b"private".as_slice())
            .and_then(|v| v.as_integer())
            .map(|v| v == 1)
            .unwrap_or(false);

        let (base_dir, files, total_length) = if let Some(length) =
            dict.get(b"length".as_slice()).and_then(|v| v.as_integer())
        {
            // Single-file mode: one entry named after the torrent itself.
            let length = length as u64;
            let file = FileEntry {
                path: PathBuf::from(&name),
                length,
                offset: 0,
            };
            (".".to_string(), vec![file], length)
        } else if let Some(files_list) = dict.get(b"files".as_slice()).and_then(|v| v.as_list()) {
            let mut files = Vec::with_capacity(files_list.len());
            let mut offset = 0u64;

            for file_value in files_list {
                let file_dict = file_value
                    .as_dict()
                    .ok_or(MetainfoError::InvalidField("files"))?;

                let length = file_dict
                    .get(b"length".as_slice())
                    .and_then(|v| v.as_integer())
                    .ok_or(MetainfoError::MissingField("file length"))?
                    as u64;

                let path_list = file_dict
                    .get(b"path".as_slice())
                    .and_then(|v| v.as_list())
                    .ok_or(MetainfoError::MissingField("file path"))?;

                if path_list.is_empty() {
                    return Err(MetainfoError::InvalidField("file path"));
                }

                let mut path = PathBuf::new();
                for component in path_list {
                    path.push(
                        component
                            .as_str()
                            .ok_or(MetainfoError::InvalidField("file path"))?,
                    );
                }

                files.push(FileEntry {
                    path,
                    length,
                    offset,
                });

                offset += length;
            }

            (name.clone(), files, offset)
        } else {
            return Err(MetainfoError::MissingField("length or files"));
        };

        Ok(Self {
            name,
            piece_length,
            pieces,
            private,
            base_dir,
            files,
            total_length,
        })
    }

    /// Returns the number of pieces in the torrent.
    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Returns the length of the piece at `index`.
    ///
    /// Every piece has the nominal length except the last, which holds
    /// whatever remains (the nominal length if the total divides evenly).
    /// Out-of-range indices yield 0.
    pub fn piece_len(&self, index: usize) -> u64 {
        let num_pieces = self.num_pieces();
        if num_pieces == 0 || index >= num_pieces {
            return 0;
        }
        if index == num_pieces - 1 {
            let rem = self.total_length % self.piece_length;
            if rem == 0 {
                self.piece_length
            } else {
                rem
            }
        } else {
            self.piece_length
        }
    }

    /// Builds the bidirectional piece-to-file mapping for this torrent.
    pub fn mapping(&self) -> PieceFileMapping {
        PieceFileMapping::for_info(self)
    }
}
