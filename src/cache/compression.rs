//! Compression Service Module
//!
//! Shrinks large serialized values before storage and restores them on
//! read. Results are memoized by content hash so identical payloads are
//! not recompressed; the memo is bounded (FIFO replacement) so it cannot
//! grow without limit under high payload cardinality.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::config::CompressionAlgorithm;
use crate::error::{CacheError, Result};

/// Maximum number of memoized compression results.
pub const COMPRESSION_CACHE_MAX_ENTRIES: usize = 1024;

type ContentHash = [u8; 32];

// == Compression Service ==
/// Pure compress/decompress pair with a bounded content-hash memo.
#[derive(Debug, Default)]
pub struct CompressionService {
    memo: Mutex<CompressionMemo>,
}

#[derive(Debug, Default)]
struct CompressionMemo {
    results: HashMap<(ContentHash, CompressionAlgorithm), Vec<u8>>,
    order: VecDeque<(ContentHash, CompressionAlgorithm)>,
}

impl CompressionService {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Compress ==
    /// Compresses `data` with `algorithm`, reusing a memoized result when
    /// the identical payload was compressed before.
    pub fn compress(&self, data: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>> {
        let hash: ContentHash = Sha256::digest(data).into();
        let memo_key = (hash, algorithm);

        {
            let memo = self.memo.lock().expect("compression memo lock poisoned");
            if let Some(cached) = memo.results.get(&memo_key) {
                return Ok(cached.clone());
            }
        }

        let compressed = compress_raw(data, algorithm)?;

        let mut memo = self.memo.lock().expect("compression memo lock poisoned");
        if !memo.results.contains_key(&memo_key) {
            if memo.order.len() >= COMPRESSION_CACHE_MAX_ENTRIES {
                if let Some(oldest) = memo.order.pop_front() {
                    memo.results.remove(&oldest);
                }
            }
            memo.order.push_back(memo_key);
            memo.results.insert(memo_key, compressed.clone());
        }

        Ok(compressed)
    }

    // == Decompress ==
    /// Restores the original bytes of a compressed value.
    pub fn decompress(&self, data: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>> {
        decompress_raw(data, algorithm)
    }

    // == Clear ==
    /// Discards every memoized result.
    pub fn clear(&self) {
        let mut memo = self.memo.lock().expect("compression memo lock poisoned");
        memo.results.clear();
        memo.order.clear();
    }

    /// Returns the number of memoized results.
    pub fn memo_len(&self) -> usize {
        self.memo
            .lock()
            .expect("compression memo lock poisoned")
            .results
            .len()
    }
}

// == Raw Codecs ==
fn compress_raw(data: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        CompressionAlgorithm::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(data)
                .map_err(|e| CacheError::Compression(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| CacheError::Compression(e.to_string()))
        }
        CompressionAlgorithm::Brotli => {
            let mut out = Vec::new();
            {
                let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
                writer
                    .write_all(data)
                    .map_err(|e| CacheError::Compression(e.to_string()))?;
                writer
                    .flush()
                    .map_err(|e| CacheError::Compression(e.to_string()))?;
            }
            Ok(out)
        }
    }
}

fn decompress_raw(data: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        CompressionAlgorithm::Gzip => {
            let mut decoder = flate2::read::GzDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| CacheError::Decompression(e.to_string()))?;
            Ok(out)
        }
        CompressionAlgorithm::Brotli => {
            let mut decoder = brotli::Decompressor::new(data, 4096);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| CacheError::Decompression(e.to_string()))?;
            Ok(out)
        }
    }
}
