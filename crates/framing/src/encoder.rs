use crate::{FrameError, ESCAPE_BYTE, START_BYTE, STOP_BYTE};

/// Frame a raw payload: prepend START, escape STOP and ESCAPE, append STOP.
///
/// START is deliberately left unescaped; the decoder only treats it as a
/// marker while idle, so a START inside a payload is recorded as data.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 4);
    framed.push(START_BYTE);
    for &b in payload {
        if b == STOP_BYTE || b == ESCAPE_BYTE {
            framed.push(ESCAPE_BYTE);
        }
        framed.push(b);
    }
    framed.push(STOP_BYTE);
    framed
}

/// Build `command | (len | data)*` and frame it.
pub fn encode(command: u8, parameters: &[&[u8]]) -> Result<Vec<u8>, FrameError> {
    let mut payload = Vec::with_capacity(1 + parameters.iter().map(|p| p.len() + 1).sum::<usize>());
    payload.push(command);
    for (index, param) in parameters.iter().enumerate() {
        let len = u8::try_from(param.len()).map_err(|_| FrameError::ParameterTooLong {
            index,
            len: param.len(),
        })?;
        payload.push(len);
        payload.extend_from_slice(param);
    }
    Ok(encode_frame(&payload))
}
