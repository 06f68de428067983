use flate2::{Decompress, FlushDecompress, Status};

/// Growth attempts before a payload is declared too large
pub(super) const MAX_GROWTHS: u32 = 4;
const MIN_SCRATCH: usize = 1024;
/// Largest starting size; the declared voxel count comes from an untrusted header
const MAX_INITIAL_SCRATCH: usize = 5 * 1024 * 1024;

#[derive(Debug)]
pub(super) enum InflateFailure {
    Corrupt(String),
    Truncated,
    Exhausted { attempts: u32, capacity: usize },
}

/// zlib inflater with a scratch buffer reused across nodes
#[derive(Debug, Default)]
pub(super) struct Inflater {
    scratch: Vec<u8>,
}

impl Inflater {
    /// Inflate a complete zlib stream, sizing the scratch buffer from `expected_len`
    ///
    /// The starting size is clamped to `MIN_SCRATCH..=MAX_INITIAL_SCRATCH`. The
    /// buffer doubles each time the stream fills it before its end marker.
    pub(super) fn inflate(&mut self, compressed: &[u8], expected_len: usize) -> Result<&[u8], InflateFailure> {
        let wanted = expected_len.clamp(MIN_SCRATCH, MAX_INITIAL_SCRATCH);
        if self.scratch.len() < wanted {
            self.scratch.resize(wanted, 0);
        }

        let mut growths = 0;
        let produced = loop {
            let mut stream = Decompress::new(true);
            let status = stream
                .decompress(compressed, &mut self.scratch, FlushDecompress::Finish)
                .map_err(|e| InflateFailure::Corrupt(e.to_string()))?;
            let total_out = stream.total_out() as usize;

            match status {
                Status::StreamEnd => break total_out,
                Status::Ok | Status::BufError => {
                    if total_out < self.scratch.len() {
                        return Err(InflateFailure::Truncated);
                    }
                    growths += 1;
                    if growths > MAX_GROWTHS {
                        return Err(InflateFailure::Exhausted {
                            attempts: MAX_GROWTHS,
                            capacity: self.scratch.len(),
                        });
                    }
                    let grown = self.scratch.len() * 2;
                    tracing::debug!(grown, "growing inflate scratch buffer");
                    self.scratch.resize(grown, 0);
                }
            }
        };

        Ok(&self.scratch[..produced])
    }
}
