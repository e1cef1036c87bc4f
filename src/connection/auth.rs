use digest::{Digest, OutputSizeUser};
use generic_array::GenericArray;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{AuthError, Error, Result};
use crate::protocol::AuthPlugin;

// caching_sha2_password extra-data tags
// https://mariadb.com/kb/en/caching_sha2_password-authentication-plugin/
pub(crate) const SHA2_FAST_AUTH_OK: u8 = 0x03;
pub(crate) const SHA2_FULL_AUTH: u8 = 0x04;

/// Sent by the client to ask for the server's RSA public key during
/// caching_sha2_password full authentication over a plaintext channel.
pub(crate) const SHA2_REQUEST_PUBLIC_KEY: u8 = 0x02;

impl AuthPlugin {
    /// Compute the authentication response for this plugin given the
    /// server's scramble.
    pub(crate) fn scramble(self, password: &str, scramble: &[u8], is_tls: bool) -> Result<Vec<u8>> {
        match self {
            // https://mariadb.com/kb/en/connection/#mysql_native_password-plugin
            AuthPlugin::MySqlNativePassword => Ok(if password.is_empty() {
                Vec::new()
            } else {
                scramble_sha1(password, scramble).to_vec()
            }),

            // https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_caching_sha2_authentication_exchanges.html
            AuthPlugin::CachingSha2Password => Ok(if password.is_empty() {
                Vec::new()
            } else {
                scramble_sha256(password, scramble).to_vec()
            }),

            AuthPlugin::MySqlClearPassword => {
                if !is_tls {
                    return Err(Error::Auth(AuthError::InsecureClearPassword));
                }

                Ok(to_asciz(password))
            }
        }
    }
}

/// `SHA1(password) ^ SHA1(scramble + SHA1(SHA1(password)))`
fn scramble_sha1(
    password: &str,
    scramble: &[u8],
) -> GenericArray<u8, <Sha1 as OutputSizeUser>::OutputSize> {
    let mut ctx = Sha1::new();

    ctx.update(password);
    let mut pw_hash = ctx.finalize_reset();

    ctx.update(pw_hash);
    let pw_hash_hash = ctx.finalize_reset();

    ctx.update(scramble);
    ctx.update(pw_hash_hash);
    let mask = ctx.finalize();

    xor_eq(&mut pw_hash, &mask);

    pw_hash
}

/// `SHA256(password) ^ SHA256(SHA256(SHA256(password)) + scramble)`
fn scramble_sha256(
    password: &str,
    scramble: &[u8],
) -> GenericArray<u8, <Sha256 as OutputSizeUser>::OutputSize> {
    let mut ctx = Sha256::new();

    ctx.update(password);
    let mut pw_hash = ctx.finalize_reset();

    ctx.update(pw_hash);
    let pw_hash_hash = ctx.finalize_reset();

    ctx.update(pw_hash_hash);
    ctx.update(scramble);
    let mask = ctx.finalize();

    xor_eq(&mut pw_hash, &mask);

    pw_hash
}

/// Encrypt the password for caching_sha2_password full authentication on a
/// plaintext channel: the NUL-terminated password is XOR-masked with the
/// scramble (repeated), then sealed with RSA OAEP-SHA1 under the public key
/// the server just sent in PEM form.
pub(crate) fn encrypt_rsa(pem: &[u8], password: &str, scramble: &[u8]) -> Result<Vec<u8>> {
    let pem = std::str::from_utf8(pem)
        .map_err(|_| Error::Auth(AuthError::MalformedAuthData("RSA key is not valid UTF-8")))?;

    let key = RsaPublicKey::from_public_key_pem(pem)
        .map_err(|err| Error::Auth(AuthError::Rsa(err.to_string())))?;

    let mut message = to_asciz(password);
    xor_eq(&mut message, scramble);

    key.encrypt(&mut rand::thread_rng(), Oaep::new::<Sha1>(), &message)
        .map_err(|err| Error::Auth(AuthError::Rsa(err.to_string())))
}

// x ^= y, cycling through y when it is shorter than x
fn xor_eq(x: &mut [u8], y: &[u8]) {
    let y_len = y.len();

    for i in 0..x.len() {
        x[i] ^= y[i % y_len];
    }
}

pub(crate) fn to_asciz(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);

    bytes
}
