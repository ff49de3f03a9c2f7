use std::fmt::Display;
use std::marker::PhantomData;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};

use super::{Frame, TransferError, CHUNK_SIZE, MAX_HEADER_SIZE};

const LEN_PREFIX: usize = 4;

/// Encode one frame for the wire.
pub fn encode<F: Frame>(frame: F) -> Result<Bytes, TransferError> {
    let (header, data) = frame.into_parts();
    if data.len() > CHUNK_SIZE {
        return Err(TransferError::ChunkTooLarge(data.len()));
    }

    let header = bincode::serialize(&header)?;
    if header.len() > MAX_HEADER_SIZE {
        return Err(TransferError::HeaderTooLarge(header.len()));
    }

    let mut buf = BytesMut::with_capacity(LEN_PREFIX * 2 + header.len() + data.len());
    buf.put_u32(header.len() as u32);
    buf.put_slice(&header);
    buf.put_u32(data.len() as u32);
    buf.put_slice(&data);
    Ok(buf.freeze())
}

/// Incremental decoder. Body chunks may split frames at any byte; feed
/// them in with [`FrameDecoder::push`] and drain complete frames with
/// [`FrameDecoder::next_frame`].
pub struct FrameDecoder<F> {
    buf: BytesMut,
    _frame: PhantomData<F>,
}

impl<F: Frame> Default for FrameDecoder<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Frame> FrameDecoder<F> {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            _frame: PhantomData,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn next_frame(&mut self) -> Result<Option<F>, TransferError> {
        if self.buf.len() < LEN_PREFIX {
            return Ok(None);
        }

        let header_len = peek_u32(&self.buf, 0);
        if header_len > MAX_HEADER_SIZE {
            return Err(TransferError::HeaderTooLarge(header_len));
        }

        let payload_len_at = LEN_PREFIX + header_len;
        if self.buf.len() < payload_len_at + LEN_PREFIX {
            return Ok(None);
        }

        let payload_len = peek_u32(&self.buf, payload_len_at);
        if payload_len > CHUNK_SIZE {
            return Err(TransferError::ChunkTooLarge(payload_len));
        }

        let frame_len = payload_len_at + LEN_PREFIX + payload_len;
        if self.buf.len() < frame_len {
            return Ok(None);
        }

        let mut frame = self.buf.split_to(frame_len);
        frame.advance(LEN_PREFIX);
        let header = frame.split_to(header_len);
        frame.advance(LEN_PREFIX);
        let header: F::Header = bincode::deserialize(&header)?;

        Ok(Some(F::from_parts(header, frame.freeze())))
    }

    /// Called at end of stream: leftover bytes mean a cut-off frame.
    pub fn finish(&self) -> Result<(), TransferError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(TransferError::Truncated)
        }
    }
}

fn peek_u32(buf: &[u8], at: usize) -> usize {
    let mut raw = [0u8; LEN_PREFIX];
    raw.copy_from_slice(&buf[at..at + LEN_PREFIX]);
    u32::from_be_bytes(raw) as usize
}

/// Turn a byte stream into a stream of decoded frames.
///
/// The first error (transport, codec or truncation) is yielded once and
/// ends the stream.
pub fn decode_stream<F, S, E>(body: S) -> impl Stream<Item = Result<F, TransferError>>
where
    F: Frame,
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    futures::stream::unfold(
        (body, FrameDecoder::<F>::new(), false),
        |(mut body, mut decoder, failed)| async move {
            if failed {
                return None;
            }
            loop {
                match decoder.next_frame() {
                    Ok(Some(frame)) => return Some((Ok(frame), (body, decoder, false))),
                    Ok(None) => {}
                    Err(e) => return Some((Err(e), (body, decoder, true))),
                }

                match body.next().await {
                    Some(Ok(bytes)) => decoder.push(&bytes),
                    Some(Err(e)) => {
                        let err = TransferError::Transport(e.to_string());
                        return Some((Err(err), (body, decoder, true)));
                    }
                    None => {
                        return match decoder.finish() {
                            Ok(()) => None,
                            Err(e) => Some((Err(e), (body, decoder, true))),
                        };
                    }
                }
            }
        },
    )
}
