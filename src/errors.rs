//! Error types.

/// Alias for [`core::result::Result`] with the `ssh-keybridge` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types.
///
/// Provider failures never carry provider-specific detail: they are logged and then
/// collapsed into the variant for the stage that failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Key bytes could not be imported: malformed input, wrong or missing passphrase,
    /// or an unsupported encoding.
    Import,

    /// The provider returned zero items, more than one item, or an item that is not a key.
    AmbiguousOrWrongType,

    /// DER input did not match the expected schema.
    Decode(der::Error),

    /// A value could not be encoded with the requested schema.
    Encode(der::Error),

    /// The raw form of a key could not be materialised.
    UnwrapUnavailable,

    /// The signing transform failed.
    Sign,

    /// The verification transform could not be evaluated.
    Verify,

    /// A DSA signature integer does not fit the fixed 160-bit SSH form.
    MalformedSignature,

    /// The key uses an algorithm other than RSA or DSA, or a format that does not
    /// belong to its algorithm.
    UnsupportedAlgorithm,

    /// Malformed SSH wire data.
    Wire,

    /// Symmetric cipher initialisation or processing failed.
    Cipher,

    /// Reading key material from disk failed.
    Io(std::io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) | Error::Encode(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Import => write!(f, "key import failed"),
            Error::AmbiguousOrWrongType => {
                write!(f, "import did not produce exactly one key item")
            }
            Error::Decode(err) => write!(f, "ASN.1 decode error: {}", err),
            Error::Encode(err) => write!(f, "ASN.1 encode error: {}", err),
            Error::UnwrapUnavailable => write!(f, "raw key form unavailable"),
            Error::Sign => write!(f, "signing failed"),
            Error::Verify => write!(f, "verification could not be evaluated"),
            Error::MalformedSignature => write!(f, "malformed DSA signature"),
            Error::UnsupportedAlgorithm => write!(f, "unsupported key algorithm"),
            Error::Wire => write!(f, "malformed SSH wire data"),
            Error::Cipher => write!(f, "cipher error"),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(feature = "cipher")]
impl From<aes::cipher::InvalidLength> for Error {
    fn from(_err: aes::cipher::InvalidLength) -> Error {
        Error::Cipher
    }
}

#[cfg(feature = "cipher")]
impl From<aes::cipher::StreamCipherError> for Error {
    fn from(_err: aes::cipher::StreamCipherError) -> Error {
        Error::Cipher
    }
}
