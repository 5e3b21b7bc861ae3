//! Packet encryptor
//!
//! Seals one RTP packet at a time under the installed key and mode. The
//! output keeps the RTP header in the clear and uses the secretbox combined
//! layout the relay opens with `crypto_secretbox_open_easy`. The tag sits in
//! front of the ciphertext because that is where secretbox puts it:
//!
//! ```text
//! [ rtp header (12) | tag (16) | ciphertext (n) | trailer (0 / 24 / 4) ]
//! ```
//!
//! Sizing and filling are separate steps. A host can ask for
//! [`PacketEncryptor::required_output_length`], allocate, and fill later, or
//! hand over a buffer to grow in place. Every destination goes through the
//! same sealing routine via [`PacketBuffer`].

use bytes::BytesMut;
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, error, info, trace, warn};
use xsalsa20poly1305::{
    aead::{AeadInPlace, KeyInit},
    Nonce, XSalsa20Poly1305,
};

use crate::core::{ConfigError, EncryptError, RTP_HEADER_SIZE, TAG_SIZE};

use super::{
    keys::SecretKey,
    nonce::{self, overhead_bytes, DerivedNonce, Scheme},
};

/// Destination strategy for a sealed packet.
///
/// `check` validates the destination without touching it. Only after that
/// (and after the nonce is derived) does `stage` hand out the whole output
/// region with the plaintext packet in its first `packet_len()` bytes.
pub trait PacketBuffer {
    /// Length of the plaintext packet, header included.
    fn packet_len(&self) -> usize;

    /// Check that an output region of exactly `output_len` bytes can be
    /// produced.
    fn check(&self, output_len: usize) -> Result<(), EncryptError>;

    /// Plaintext packet. Only called after `check` succeeded.
    fn packet(&self) -> &[u8];

    /// Prepare the output region. Only called after `check` succeeded.
    fn stage(&mut self, output_len: usize) -> &mut [u8];
}

impl<T: PacketBuffer + ?Sized> PacketBuffer for &mut T {
    fn packet_len(&self) -> usize {
        (**self).packet_len()
    }

    fn check(&self, output_len: usize) -> Result<(), EncryptError> {
        (**self).check(output_len)
    }

    fn packet(&self) -> &[u8] {
        (**self).packet()
    }

    fn stage(&mut self, output_len: usize) -> &mut [u8] {
        (**self).stage(output_len)
    }
}

/// A buffer the caller has already grown to the required output length.
///
/// The plaintext packet occupies the first `packet_len` bytes.
#[derive(Debug)]
pub struct InPlace<'a> {
    buffer: &'a mut [u8],
    packet_len: usize,
}

impl<'a> InPlace<'a> {
    /// Wrap a pre-grown buffer.
    pub fn new(buffer: &'a mut [u8], packet_len: usize) -> Self {
        Self { buffer, packet_len }
    }
}

impl PacketBuffer for InPlace<'_> {
    fn packet_len(&self) -> usize {
        self.packet_len
    }

    fn check(&self, output_len: usize) -> Result<(), EncryptError> {
        if self.packet_len > self.buffer.len() {
            return Err(output_len_error(output_len, self.buffer.len()));
        }
        check_output_len(output_len, self.buffer.len())
    }

    fn packet(&self) -> &[u8] {
        &self.buffer[..self.packet_len]
    }

    fn stage(&mut self, _output_len: usize) -> &mut [u8] {
        &mut *self.buffer
    }
}

/// A buffer holding exactly the plaintext packet, grown by the encryptor.
#[derive(Debug)]
pub struct Grow<'a>(pub &'a mut BytesMut);

impl PacketBuffer for Grow<'_> {
    fn packet_len(&self) -> usize {
        self.0.len()
    }

    fn check(&self, _output_len: usize) -> Result<(), EncryptError> {
        Ok(())
    }

    fn packet(&self) -> &[u8] {
        &self.0[..]
    }

    fn stage(&mut self, output_len: usize) -> &mut [u8] {
        self.0.resize(output_len, 0);
        &mut self.0[..]
    }
}

/// A fresh output buffer distinct from the input packet.
#[derive(Debug)]
pub struct CopyInto<'a> {
    input: &'a [u8],
    output: &'a mut [u8],
}

impl<'a> CopyInto<'a> {
    /// Pair an input packet with an output buffer of the required length.
    pub fn new(input: &'a [u8], output: &'a mut [u8]) -> Self {
        Self { input, output }
    }
}

impl PacketBuffer for CopyInto<'_> {
    fn packet_len(&self) -> usize {
        self.input.len()
    }

    fn check(&self, output_len: usize) -> Result<(), EncryptError> {
        check_output_len(output_len, self.output.len())
    }

    fn packet(&self) -> &[u8] {
        self.input
    }

    fn stage(&mut self, _output_len: usize) -> &mut [u8] {
        self.output[..self.input.len()].copy_from_slice(self.input);
        &mut *self.output
    }
}

fn check_output_len(expected: usize, actual: usize) -> Result<(), EncryptError> {
    if expected != actual {
        return Err(output_len_error(expected, actual));
    }
    Ok(())
}

fn output_len_error(expected: usize, actual: usize) -> EncryptError {
    warn!(expected, actual, "output buffer has wrong size");
    EncryptError::OutputLength { expected, actual }
}

/// Encrypts RTP packets for a voice relay.
///
/// Owns the secret key, the active mode and the lite counter. `encrypt`
/// takes `&mut self`; share an instance across threads only behind a lock.
#[derive(Debug)]
pub struct PacketEncryptor {
    /// Installed secret key
    key: SecretKey,
    /// Active encryption mode
    scheme: Scheme,
    /// Lite-mode nonce counter, relative to `key`
    lite_counter: u32,
    /// Set by a successful `start`
    started: bool,
}

impl PacketEncryptor {
    /// Create an encryptor in the default (lite) mode.
    pub fn new(key: SecretKey) -> Self {
        Self::with_scheme(key, Scheme::default())
    }

    /// Create an encryptor in the given mode.
    pub fn with_scheme(key: SecretKey, scheme: Scheme) -> Self {
        Self {
            key,
            scheme,
            lite_counter: 0,
            started: false,
        }
    }

    /// Install a new key from raw bytes and reset the lite counter.
    ///
    /// # Errors
    /// Returns `InvalidKeyLength` unless `key` is exactly 32 bytes. The
    /// previous key stays installed.
    pub fn configure_key(&mut self, key: &[u8]) -> Result<(), ConfigError> {
        let key = SecretKey::from_slice(key).inspect_err(|e| {
            warn!(error = %e, "rejected key, keeping previous key");
        })?;
        self.set_key(key);
        Ok(())
    }

    /// Install a new key and reset the lite counter.
    pub fn set_key(&mut self, key: SecretKey) {
        self.key = key;
        self.lite_counter = 0;
        debug!("installed new key, lite counter reset");
    }

    /// Switch the encryption mode. The lite counter is kept.
    pub fn configure_scheme(&mut self, scheme: Scheme) {
        debug!(from = %self.scheme, to = %scheme, "switching encryption mode");
        self.scheme = scheme;
    }

    /// Get the active encryption mode.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Get the counter the next lite-mode packet will carry.
    pub fn lite_counter(&self) -> u32 {
        self.lite_counter
    }

    /// Whether `start` has succeeded.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Check the OS random source and allow encryption.
    ///
    /// # Errors
    /// Returns `Initialization` if the random source is unavailable. The
    /// encryptor stays stopped and refuses every packet.
    pub fn start(&mut self) -> Result<(), EncryptError> {
        info!(scheme = %self.scheme, "starting packet encryptor");

        let mut sample = [0u8; 1];
        if let Err(e) = OsRng.try_fill_bytes(&mut sample) {
            error!(error = %e, "failed to initialize random source");
            self.started = false;
            return Err(EncryptError::Initialization(e.to_string()));
        }

        self.started = true;
        Ok(())
    }

    /// Stop encrypting. Nothing needs cleaning up.
    pub fn stop(&mut self) {
        info!("stopping packet encryptor");
        self.started = false;
    }

    /// Output length for a packet of `input_len` bytes in the active mode.
    ///
    /// Saturates at `usize::MAX`, which no real buffer can match.
    pub fn required_output_length(&self, input_len: usize) -> usize {
        input_len.saturating_add(overhead_bytes(self.scheme))
    }

    /// Seal one packet into `dest`.
    ///
    /// The lite counter advances exactly once per sealed packet and never on
    /// failure.
    ///
    /// # Errors
    /// - `NotStarted` before a successful `start`
    /// - `ShortPacket` if the packet is shorter than the RTP header
    /// - `OutputLength` if a caller-sized buffer has the wrong length
    /// - `EncryptionBackend` if the cipher or random source fails
    pub fn encrypt<B: PacketBuffer>(&mut self, mut dest: B) -> Result<(), EncryptError> {
        if !self.started {
            return Err(EncryptError::NotStarted);
        }

        let packet_len = dest.packet_len();
        if packet_len < RTP_HEADER_SIZE {
            warn!(len = packet_len, "dropping packet shorter than RTP header");
            return Err(EncryptError::ShortPacket {
                len: packet_len,
                min: RTP_HEADER_SIZE,
            });
        }

        let output_len = self.required_output_length(packet_len);
        dest.check(output_len)?;

        let mut header = [0u8; RTP_HEADER_SIZE];
        header.copy_from_slice(&dest.packet()[..RTP_HEADER_SIZE]);
        let derived = nonce::derive(self.scheme, &header, self.lite_counter)?;

        let out = dest.stage(output_len);
        self.seal(out, packet_len, &derived)?;

        trace!(
            scheme = %self.scheme,
            packet_len,
            output_len,
            lite_counter = self.lite_counter,
            "sealed packet"
        );
        self.lite_counter = derived.next_counter;
        Ok(())
    }

    /// Seal a buffer the caller already grew to the required length.
    pub fn encrypt_in_place(
        &mut self,
        buffer: &mut [u8],
        packet_len: usize,
    ) -> Result<(), EncryptError> {
        self.encrypt(InPlace::new(buffer, packet_len))
    }

    /// Grow `packet` to the required length and seal it in place.
    pub fn encrypt_packet(&mut self, packet: &mut BytesMut) -> Result<(), EncryptError> {
        self.encrypt(Grow(packet))
    }

    /// Seal `input` into a separate, pre-sized `output` buffer.
    pub fn encrypt_into(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), EncryptError> {
        self.encrypt(CopyInto::new(input, output))
    }

    /// Seal `input` into a newly allocated buffer.
    pub fn encrypt_to_vec(&mut self, input: &[u8]) -> Result<Vec<u8>, EncryptError> {
        let mut output = vec![0u8; self.required_output_length(input.len())];
        self.encrypt(CopyInto::new(input, &mut output))?;
        Ok(output)
    }

    /// Encrypt `out[RTP_HEADER_SIZE..packet_len]` and lay out tag,
    /// ciphertext and trailer behind the header.
    fn seal(
        &self,
        out: &mut [u8],
        packet_len: usize,
        derived: &DerivedNonce,
    ) -> Result<(), EncryptError> {
        let body = RTP_HEADER_SIZE + TAG_SIZE;
        let payload_len = packet_len - RTP_HEADER_SIZE;

        out.copy_within(RTP_HEADER_SIZE..packet_len, body);

        let cipher = XSalsa20Poly1305::new(self.key.as_bytes().into());
        let tag = cipher
            .encrypt_in_place_detached(
                Nonce::from_slice(&derived.nonce),
                b"",
                &mut out[body..body + payload_len],
            )
            .map_err(|_| {
                error!("XSalsa20-Poly1305 encryption failed");
                EncryptError::EncryptionBackend
            })?;
        out[RTP_HEADER_SIZE..body].copy_from_slice(&tag);

        let trailer_at = self.required_output_length(packet_len) - derived.trailer.len();
        out[trailer_at..].copy_from_slice(derived.trailer.as_slice());

        Ok(())
    }
}
