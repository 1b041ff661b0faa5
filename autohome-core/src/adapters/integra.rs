use std::collections::BTreeSet;
use std::io::{BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::configs::Alarm;
use crate::errors::AlarmError;

pub trait AlarmPanel: Send + Sync {
    /// Zones currently reported as violated (open, triggered).
    fn violated_zones(&self) -> Result<BTreeSet<u16>, AlarmError>;

    /// The panel's own clock, as the panel reports it.
    fn current_time(&self) -> Result<String, AlarmError>;
}

const SYNC: u8 = 0xFE;
const STUFFED: u8 = 0xF0;
const END: u8 = 0x0D;
const RESULT: u8 = 0xEF;

const CMD_ZONES_VIOLATION: u8 = 0x00;
const CMD_RTC_AND_STATUS: u8 = 0x1A;

/// Satel INTEGRA panel reached through an ETHM-1 module's integration port.
///
/// Every query opens its own connection; the module serves one integration
/// client at a time and answers `Busy!` to everybody else.
pub struct IntegraClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl IntegraClient {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_settings(alarm: &Alarm) -> Self {
        Self::new(&alarm.host, alarm.port, Duration::from_millis(alarm.timeout_ms))
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn connect(&self) -> Result<TcpStream, AlarmError> {
        let endpoint = format!("{}:{}", self.host, self.port);
        let connect_error = |source| AlarmError::Connect {
            endpoint: endpoint.clone(),
            source,
        };

        let mut last_error = None;
        for address in (self.host.as_str(), self.port).to_socket_addrs().map_err(connect_error)? {
            match TcpStream::connect_timeout(&address, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(connect_error(last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no address")
        })))
    }

    /// Sends one command and returns the answer's data bytes.
    fn query(&self, command: u8, data: &[u8]) -> Result<Vec<u8>, AlarmError> {
        let timeout_ms = self.timeout_ms();
        let io_error = |e| AlarmError::from_io(e, timeout_ms);

        let mut stream = self.connect()?;
        stream.set_read_timeout(Some(self.timeout)).map_err(io_error)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(io_error)?;

        let mut request = Vec::with_capacity(data.len() + 1);
        request.push(command);
        request.extend_from_slice(data);

        tracing::debug!("INTEGRA request {:02x?}", request);
        stream.write_all(&encode_frame(&request)).map_err(io_error)?;

        let answer = read_frame(&mut BufReader::new(stream)).map_err(|e| match e {
            AlarmError::Io(e) => AlarmError::from_io(e, timeout_ms),
            other => other,
        })?;
        tracing::debug!("INTEGRA answer {:02x?}", answer);

        match answer.split_first() {
            Some((&RESULT, rest)) => Err(AlarmError::Rejected(rest.first().copied().unwrap_or(0xFF))),
            Some((&code, rest)) if code == command => Ok(rest.to_vec()),
            Some((&code, _)) => Err(AlarmError::Protocol(format!(
                "answer to command {command:#04x} carries command {code:#04x}"
            ))),
            None => Err(AlarmError::Protocol("empty answer".into())),
        }
    }
}

impl AlarmPanel for IntegraClient {
    fn violated_zones(&self) -> Result<BTreeSet<u16>, AlarmError> {
        let bitmap = self.query(CMD_ZONES_VIOLATION, &[])?;

        decode_zone_bitmap(&bitmap)
    }

    fn current_time(&self) -> Result<String, AlarmError> {
        let status = self.query(CMD_RTC_AND_STATUS, &[])?;

        decode_rtc(&status)
    }
}

/// INTEGRA frame checksum.
pub fn checksum(payload: &[u8]) -> u16 {
    payload.iter().fold(0x147A_u16, |crc, &byte| {
        let crc = !crc.rotate_left(1);
        crc.wrapping_add(crc >> 8).wrapping_add(byte as u16)
    })
}

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let crc = checksum(payload).to_be_bytes();
    let mut frame = Vec::with_capacity(payload.len() + 6);

    frame.extend_from_slice(&[SYNC, SYNC]);
    for &byte in payload.iter().chain(crc.iter()) {
        frame.push(byte);
        if byte == SYNC {
            frame.push(STUFFED);
        }
    }
    frame.extend_from_slice(&[SYNC, END]);

    frame
}

/// Reads one frame and returns its unstuffed payload without the checksum.
pub fn read_frame(reader: &mut impl Read) -> Result<Vec<u8>, AlarmError> {
    let mut next = || -> Result<u8, AlarmError> {
        let mut byte = [0u8; 1];
        match reader.read(&mut byte)? {
            0 => Err(AlarmError::Protocol("connection closed mid-frame".into())),
            _ => Ok(byte[0]),
        }
    };

    match next()? {
        SYNC => {}
        b'B' => return Err(AlarmError::Busy),
        other => return Err(AlarmError::Protocol(format!("unexpected leading byte {other:#04x}"))),
    }
    if next()? != SYNC {
        return Err(AlarmError::Protocol("missing frame sync".into()));
    }

    let mut payload = Vec::new();
    loop {
        match next()? {
            SYNC => match next()? {
                STUFFED => payload.push(SYNC),
                END => break,
                other => {
                    return Err(AlarmError::Protocol(format!("invalid escape {other:#04x}")));
                }
            },
            byte => payload.push(byte),
        }
    }

    if payload.len() < 3 {
        return Err(AlarmError::Protocol(format!("frame too short ({} bytes)", payload.len())));
    }

    let (body, crc) = payload.split_at(payload.len() - 2);
    if checksum(body) != u16::from_be_bytes([crc[0], crc[1]]) {
        return Err(AlarmError::CrcMismatch);
    }

    Ok(body.to_vec())
}

/// Zone `8k + n + 1` is violated when bit `n` of byte `k` is set.
pub fn decode_zone_bitmap(bitmap: &[u8]) -> Result<BTreeSet<u16>, AlarmError> {
    if bitmap.len() < 16 {
        return Err(AlarmError::Protocol(format!(
            "zone bitmap has {} bytes, expected at least 16",
            bitmap.len()
        )));
    }

    Ok(bitmap
        .iter()
        .enumerate()
        .flat_map(|(index, byte)| {
            (0..8)
                .filter(move |&bit| byte & (1u8 << bit) != 0)
                .map(move |bit| (index * 8 + bit + 1) as u16)
        })
        .collect())
}

/// Renders the BCD clock `YYYY MM DD hh mm ss` digit for digit.
pub fn decode_rtc(status: &[u8]) -> Result<String, AlarmError> {
    match status {
        [y1, y2, month, day, hour, minute, second, ..] => Ok(format!(
            "{y1:02x}{y2:02x}-{month:02x}-{day:02x} {hour:02x}:{minute:02x}:{second:02x}"
        )),
        _ => Err(AlarmError::Protocol(format!(
            "clock answer has {} bytes, expected at least 7",
            status.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn zones_answer(violated: &[u16]) -> Vec<u8> {
        let mut payload = vec![CMD_ZONES_VIOLATION];
        let mut bitmap = [0u8; 16];
        for zone in violated {
            let index = (zone - 1) as usize;
            bitmap[index / 8] |= 1 << (index % 8);
        }
        payload.extend_from_slice(&bitmap);
        encode_frame(&payload)
    }

    /// Serves a single connection: reads one request frame and replies with `answer`.
    fn fake_module(answer: Vec<u8>) -> (u16, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_frame(&mut stream).unwrap();
            stream.write_all(&answer).unwrap();
            request
        });

        (port, handle)
    }

    #[test]
    fn test_checksum_matches_reference_frame() {
        assert_eq!(encode_frame(&[0x09]), vec![0xFE, 0xFE, 0x09, 0xD7, 0xEB, 0xFE, 0x0D]);
        assert_eq!(checksum(&[0x00]), 0xD7E2);
    }

    #[test]
    fn test_sync_bytes_are_stuffed() {
        let frame = encode_frame(&[0x1A, 0xFE, 0x01]);
        let payload = read_frame(&mut frame.as_slice()).unwrap();

        assert_eq!(&frame[2..6], &[0x1A, 0xFE, 0xF0, 0x01]);
        assert_eq!(payload, vec![0x1A, 0xFE, 0x01]);
    }

    #[test]
    fn test_read_frame_rejects_corruption() {
        let mut frame = encode_frame(&[0x00, 0x80]);
        frame[3] = 0x81;

        assert!(matches!(read_frame(&mut frame.as_slice()), Err(AlarmError::CrcMismatch)));
        assert!(matches!(read_frame(&mut &b"Busy!\r\n"[..]), Err(AlarmError::Busy)));
        assert!(matches!(
            read_frame(&mut &[0xFE, 0xFE, 0x00][..]),
            Err(AlarmError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_zone_bitmap() {
        let mut bitmap = [0u8; 16];
        bitmap[0] = 0b1000_0001;
        bitmap[1] = 0b0000_0001;
        bitmap[15] = 0b1000_0000;

        let zones = decode_zone_bitmap(&bitmap).unwrap();

        assert_eq!(zones.into_iter().collect::<Vec<_>>(), vec![1, 8, 9, 128]);
        assert!(decode_zone_bitmap(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_decode_rtc() {
        let status = [0x20, 0x24, 0x06, 0x21, 0x18, 0x30, 0x05, 0x04, 0x72];

        assert_eq!(decode_rtc(&status).unwrap(), "2024-06-21 18:30:05");
        assert!(decode_rtc(&status[..3]).is_err());
    }

    #[test]
    fn test_client_reads_violated_zones() {
        let (port, module) = fake_module(zones_answer(&[8, 9]));
        let client = IntegraClient::new("127.0.0.1", port, Duration::from_secs(2));

        let zones = client.violated_zones().unwrap();

        assert_eq!(zones, BTreeSet::from([8, 9]));
        assert_eq!(module.join().unwrap(), vec![CMD_ZONES_VIOLATION]);
    }

    #[test]
    fn test_client_reports_panel_rejection() {
        let (port, module) = fake_module(encode_frame(&[RESULT, 0x08]));
        let client = IntegraClient::new("127.0.0.1", port, Duration::from_secs(2));

        assert!(matches!(client.current_time(), Err(AlarmError::Rejected(0x08))));
        assert_eq!(module.join().unwrap(), vec![CMD_RTC_AND_STATUS]);
    }

    #[test]
    fn test_client_unreachable_panel() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = IntegraClient::new("127.0.0.1", port, Duration::from_millis(500));

        assert!(matches!(client.violated_zones(), Err(AlarmError::Connect { .. })));
    }

    #[test]
    fn test_client_times_out_on_silent_module() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let module = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(600));
            drop(stream);
        });
        let client = IntegraClient::new("127.0.0.1", port, Duration::from_millis(200));

        assert!(matches!(client.violated_zones(), Err(AlarmError::Timeout(200))));
        module.join().unwrap();
    }
}
