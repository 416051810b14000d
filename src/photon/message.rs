use crate::photon::reader::ByteReader;
use crate::photon::value::decode_value;
use crate::photon::{DecodeError, Parameters};

/// Message-type bytes carried at offset 1 of a command payload.
pub mod msg_type {
    pub const OPERATION_REQUEST: u8 = 2;
    pub const OPERATION_RESPONSE: u8 = 3;
    pub const EVENT_DATA: u8 = 4;
}

/// Protocol signature expected at offset 0 of a command payload.
pub const SIGNATURE: u8 = 0xF3;

/// One application-level message decoded from a command payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Event { code: u8, parameters: Parameters },
    OperationRequest {
        operation_code: u8,
        parameters: Parameters,
    },
    OperationResponse {
        operation_code: u8,
        return_code: i16,
        parameters: Parameters,
    },
}

/// Result of decoding a command payload.
///
/// Payloads carrying message types the tracker has no use for come back as
/// `Skipped`; only structurally broken payloads are errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message(Message),
    Skipped { message_type: u8 },
}

/// Decodes one reliable/unreliable command payload.
pub fn decode_command_payload(payload: &[u8]) -> Result<Decoded, DecodeError> {
    let mut reader = ByteReader::new(payload);
    // Byte 0 is the protocol signature; it is not interpreted.
    let _signature = reader.read_u8()?;
    let message_type = reader.read_u8()?;

    let message = match message_type {
        msg_type::EVENT_DATA => {
            let code = reader.read_u8()?;
            let parameters = decode_parameters(&mut reader)?;
            Message::Event { code, parameters }
        }
        msg_type::OPERATION_REQUEST => {
            let operation_code = reader.read_u8()?;
            let parameters = decode_parameters(&mut reader)?;
            Message::OperationRequest {
                operation_code,
                parameters,
            }
        }
        msg_type::OPERATION_RESPONSE => {
            let operation_code = reader.read_u8()?;
            let return_code = reader.read_i16()?;
            let parameters = decode_parameters(&mut reader)?;
            Message::OperationResponse {
                operation_code,
                return_code,
                parameters,
            }
        }
        other => return Ok(Decoded::Skipped { message_type: other }),
    };

    Ok(Decoded::Message(message))
}

// Parameter table: u16 entry count, then (slot byte, tagged value) pairs.
fn decode_parameters(reader: &mut ByteReader<'_>) -> Result<Parameters, DecodeError> {
    let count = reader.read_u16()?;
    let mut parameters = Parameters::new();
    for _ in 0..count {
        let slot = reader.read_u8()?;
        let value = decode_value(reader)?;
        parameters.insert(slot, value);
    }
    Ok(parameters)
}

/// Encodes an event-data payload; inverse of the event arm of
/// [`decode_command_payload`]. Test and tooling support.
pub fn encode_event_payload(code: u8, parameters: &Parameters) -> Vec<u8> {
    let mut out = vec![SIGNATURE, msg_type::EVENT_DATA, code];
    encode_parameters(parameters, &mut out);
    out
}

/// Encodes an operation-request payload.
pub fn encode_request_payload(operation_code: u8, parameters: &Parameters) -> Vec<u8> {
    let mut out = vec![SIGNATURE, msg_type::OPERATION_REQUEST, operation_code];
    encode_parameters(parameters, &mut out);
    out
}

/// Encodes an operation-response payload.
pub fn encode_response_payload(
    operation_code: u8,
    return_code: i16,
    parameters: &Parameters,
) -> Vec<u8> {
    let mut out = vec![SIGNATURE, msg_type::OPERATION_RESPONSE, operation_code];
    out.extend_from_slice(&return_code.to_be_bytes());
    encode_parameters(parameters, &mut out);
    out
}

fn encode_parameters(parameters: &Parameters, out: &mut Vec<u8>) {
    out.extend_from_slice(&(parameters.len() as u16).to_be_bytes());
    for (slot, value) in parameters.iter() {
        out.push(slot);
        crate::photon::value::encode_value(value, out);
    }
}
