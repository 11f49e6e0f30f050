//! Socket ownership collector (netstat2 socket table).

use super::{Protocol, SocketRecord, SocketSource, SocketState};
use crate::config::SocketsConfig;
use crate::error::{AccessError, CollectionError};
use netstat2::{
    iterate_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState,
};

pub struct NetstatSocketSource {
    config: SocketsConfig,
}

impl NetstatSocketSource {
    pub fn new(config: SocketsConfig) -> Self {
        Self { config }
    }

    fn protocols(&self) -> ProtocolFlags {
        if self.config.include_udp {
            ProtocolFlags::TCP | ProtocolFlags::UDP
        } else {
            ProtocolFlags::TCP
        }
    }

    /// Listening TCP always; established TCP and bound UDP when configured.
    fn wanted(&self, protocol: Protocol, state: Option<SocketState>) -> bool {
        match (protocol, state) {
            (Protocol::Tcp, Some(SocketState::Listen)) => true,
            (Protocol::Tcp, Some(SocketState::Established)) => self.config.include_established,
            (Protocol::Udp, _) => self.config.include_udp,
            _ => false,
        }
    }
}

impl SocketSource for NetstatSocketSource {
    fn sockets(&mut self) -> Result<Vec<Result<SocketRecord, AccessError>>, CollectionError> {
        let iter = iterate_sockets_info(
            AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
            self.protocols(),
        )
        .map_err(|e| CollectionError::Sockets(e.to_string()))?;

        let mut out = Vec::new();
        for item in iter {
            let info = match item {
                Ok(info) => info,
                Err(e) => {
                    out.push(Err(AccessError::Other(e.to_string())));
                    continue;
                }
            };
            let (protocol, local_port, state) = match info.protocol_socket_info {
                ProtocolSocketInfo::Tcp(tcp) => {
                    let state = match tcp.state {
                        TcpState::Listen => SocketState::Listen,
                        TcpState::Established => SocketState::Established,
                        _ => SocketState::Other,
                    };
                    (Protocol::Tcp, tcp.local_port, Some(state))
                }
                ProtocolSocketInfo::Udp(udp) => (Protocol::Udp, udp.local_port, None),
            };
            if !self.wanted(protocol, state) {
                continue;
            }
            if info.associated_pids.is_empty() {
                out.push(Ok(SocketRecord {
                    local_port,
                    pid: None,
                    protocol,
                    state,
                }));
                continue;
            }
            for pid in info.associated_pids {
                out.push(Ok(SocketRecord {
                    local_port,
                    pid: Some(pid),
                    protocol,
                    state,
                }));
            }
        }
        Ok(out)
    }
}
