error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }

    foreign_links {
        Hex(::hex::FromHexError);
        Encode(::bitcoin::consensus::encode::Error);
    }

    errors {
        InvalidSeed(len: usize) {
            description("invalid identity seed")
            display("invalid identity seed: expected 32 bytes, got {}", len)
        }

        InvalidPublicKey(msg: String) {
            description("invalid public key")
            display("invalid public key: {}", msg)
        }

        WeakSharedSecret {
            description("shared secret derivation produced an all-zero value")
        }

        BlockUnavailable(height: u32) {
            description("block unavailable")
            display("block at height {} could not be read", height)
        }

        UnknownNetwork(name: String) {
            description("unknown network")
            display("unsupported network: {:?}", name)
        }
    }
}
