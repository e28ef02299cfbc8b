pub mod tickets {

    /// First human-facing ticket number handed out. The counter row is
    /// seeded one below so the first increment lands here.
    pub const SEQUENCE_START: i64 = 500;

    pub const COUNTER_NAME: &str = "note_ticket";
}

pub mod reset {

    /// Reset tickets are valid for this long after issuance. Expiry is
    /// checked lazily at consumption time; there is no background sweep.
    pub const TTL_MINUTES: i64 = 60;

    /// Raw secret length in hex characters (32 random bytes).
    pub const SECRET_HEX_LEN: usize = 64;
}

pub mod limits {

    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    pub const MAX_PAGE_SIZE: u64 = 100;
}
