//! Length-prefixed frames as sent by capture devices.
//!
//! Every frame is a 4-byte little-endian payload length followed by the
//! payload. A [`Message`] is two frames: its type name, then its payload.

use std::io::{self, Read, Write};

use log::debug;

/// Payload type name of an encoded still image.
pub const IMAGE_DATA: &str = "ImageData";
/// Payload type name of a UTF-8 text message.
pub const STRING_DATA: &str = "StringData";

/// Upper bound on a single frame unless the caller picks another.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
    #[error("frame is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("stream ends inside a message")]
    Truncated,
    #[error("unknown payload type `{0}`")]
    UnknownType(String),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
}

// `Ok(None)` when the stream ends before the first header byte.
fn read_len<R: Read>(reader: &mut R) -> io::Result<Option<usize>> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(u32::from_le_bytes(header) as usize))
}

fn read_payload<R: Read>(
    reader: &mut R,
    len: usize,
    max_len: usize,
) -> Result<Vec<u8>, FrameError> {
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Read one frame; fails on EOF inside the header or payload.
pub fn read_frame<R: Read>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, FrameError> {
    let len = read_len(reader)?.ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
    read_payload(reader, len, max_len)
}

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Encoded image file bytes (JPEG, PNG, ...).
    Image(Vec<u8>),
    Text(String),
}

impl Message {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Image(_) => IMAGE_DATA,
            Self::Text(_) => STRING_DATA,
        }
    }
}

/// Read a type-name frame and the payload frame that follows it.
///
/// Any EOF, including one before the message starts, is an error.
pub fn read_message<R: Read>(reader: &mut R, max_len: usize) -> Result<Message, FrameError> {
    next_message(reader, max_len)?
        .ok_or_else(|| FrameError::Io(io::ErrorKind::UnexpectedEof.into()))
}

/// Like [`read_message`], but `Ok(None)` when the stream ends cleanly
/// between messages. EOF anywhere inside a message is
/// [`FrameError::Truncated`].
pub fn next_message<R: Read>(
    reader: &mut R,
    max_len: usize,
) -> Result<Option<Message>, FrameError> {
    let name_len = match read_len(reader) {
        Ok(Some(len)) => len,
        Ok(None) => return Ok(None),
        Err(e) => return Err(truncated(e.into())),
    };
    read_body(reader, name_len, max_len)
        .map(Some)
        .map_err(truncated)
}

fn truncated(err: FrameError) -> FrameError {
    match err {
        FrameError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => FrameError::Truncated,
        other => other,
    }
}

fn read_body<R: Read>(
    reader: &mut R,
    name_len: usize,
    max_len: usize,
) -> Result<Message, FrameError> {
    let name = String::from_utf8(read_payload(reader, name_len, max_len)?)?;
    let message = match name.as_str() {
        IMAGE_DATA => Message::Image(read_frame(reader, max_len)?),
        STRING_DATA => Message::Text(String::from_utf8(read_frame(reader, max_len)?)?),
        _ => return Err(FrameError::UnknownType(name)),
    };
    debug!("received {name} message");
    Ok(message)
}

pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<(), FrameError> {
    write_frame(writer, message.type_name().as_bytes())?;
    match message {
        Message::Image(bytes) => write_frame(writer, bytes),
        Message::Text(text) => write_frame(writer, text.as_bytes()),
    }
}

/// Decode an image frame payload into RGB.
#[cfg(feature = "image")]
pub fn decode_frame(payload: &[u8]) -> Result<crate::core::RgbImage, FrameError> {
    let img = ::image::load_from_memory(payload)?;
    Ok(crate::convert::to_rgb(&img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frame_header_is_little_endian() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"abc").expect("write");
        assert_eq!(buf, [3, 0, 0, 0, b'a', b'b', b'c']);

        let mut cursor = Cursor::new(buf);
        assert_eq!(
            read_frame(&mut cursor, DEFAULT_MAX_FRAME_LEN).expect("read"),
            b"abc"
        );
    }

    #[test]
    fn messages_follow_each_other() {
        let sent = [
            Message::Text("start".into()),
            Message::Image(vec![1, 2, 3, 4]),
            Message::Text(String::new()),
        ];
        let mut buf = Vec::new();
        for m in &sent {
            write_message(&mut buf, m).expect("write");
        }

        let mut cursor = Cursor::new(buf);
        for m in &sent {
            assert_eq!(&read_message(&mut cursor, 1024).expect("read"), m);
        }
        assert!(matches!(
            read_message(&mut cursor, 1024),
            Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn stream_end_between_messages_is_clean() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Message::Text("hello".into())).expect("write");

        let mut cursor = Cursor::new(buf);
        assert_eq!(
            next_message(&mut cursor, 1024).expect("first"),
            Some(Message::Text("hello".into()))
        );
        assert_eq!(next_message(&mut cursor, 1024).expect("end"), None);
    }

    #[test]
    fn cut_inside_a_message_is_truncated() {
        let mut whole = Vec::new();
        write_message(&mut whole, &Message::Image(vec![7; 40])).expect("write");

        // Inside the type header, the type name, the payload header and the payload.
        for cut in [2, 6, 15, whole.len() - 20] {
            let mut cursor = Cursor::new(&whole[..cut]);
            let err = next_message(&mut cursor, 1024).unwrap_err();
            assert!(matches!(err, FrameError::Truncated), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn oversized_frame_is_refused() {
        let mut cursor = Cursor::new(vec![0, 1, 0, 0]);
        assert!(matches!(
            read_frame(&mut cursor, 100),
            Err(FrameError::TooLarge { len: 256, max: 100 })
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut cursor = Cursor::new(vec![5, 0, 0, 0, 1, 2]);
        assert!(matches!(
            read_frame(&mut cursor, 100),
            Err(FrameError::Io(_))
        ));
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"AudioData").expect("write");
        write_frame(&mut buf, &[0; 8]).expect("write");
        let err = read_message(&mut Cursor::new(buf), 1024).unwrap_err();
        assert!(matches!(err, FrameError::UnknownType(ref n) if n == "AudioData"));
    }

    #[cfg(feature = "image")]
    #[test]
    fn png_frame_decodes_to_rgb() {
        let mut img = ::image::GrayImage::new(3, 2);
        img.put_pixel(2, 1, ::image::Luma([200]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ::image::ImageFormat::Png)
            .expect("encode");

        let rgb = decode_frame(&png).expect("decode");
        assert_eq!((rgb.width, rgb.height), (3, 2));
        assert_eq!(rgb.get(2, 1), [200, 200, 200]);
        assert_eq!(rgb.get(0, 0), [0, 0, 0]);
    }
}
