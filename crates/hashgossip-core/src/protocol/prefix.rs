//! Datagram kind tags.

/// Width of the tag at the start of every datagram.
pub const PREFIX_LEN: usize = 5;

/// The kind of a datagram, selected by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A message to store and forward
    Message,
    /// Reply to `Hello`: membership snapshot plus current message
    Welcome,
    /// Reply to `Monitoring`: the current message
    Report,
    /// Request for a `Report`
    Monitoring,
    /// Terminate the receiving process
    Shutdown,
    /// Discovery request, answered with `Welcome`
    Hello,
}

impl MessageKind {
    pub const ALL: [MessageKind; 6] = [
        MessageKind::Message,
        MessageKind::Welcome,
        MessageKind::Report,
        MessageKind::Monitoring,
        MessageKind::Shutdown,
        MessageKind::Hello,
    ];

    /// The wire tag for this kind.
    pub fn tag(&self) -> &'static [u8; PREFIX_LEN] {
        match self {
            MessageKind::Message => b"MESSG",
            MessageKind::Welcome => b"WELCM",
            MessageKind::Report => b"REPRT",
            MessageKind::Monitoring => b"MONIT",
            MessageKind::Shutdown => b"SHTDN",
            MessageKind::Hello => b"HELLO",
        }
    }

    /// Look up the kind for a tag. `None` for anything that is not an exact match.
    pub fn from_tag(header: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == header)
    }

    /// Split a datagram into its kind and body.
    ///
    /// Returns `None` for datagrams shorter than the tag or with an unknown tag.
    pub fn split(datagram: &[u8]) -> Option<(Self, &[u8])> {
        if datagram.len() < PREFIX_LEN {
            return None;
        }
        let (header, body) = datagram.split_at(PREFIX_LEN);
        Self::from_tag(header).map(|kind| (kind, body))
    }
}
