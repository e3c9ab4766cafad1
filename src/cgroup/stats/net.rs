use std::io::BufRead;

/// Counters of a single interface, as reported in `/proc/net/dev`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkStat {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Packets received.
    pub rx_packets: u64,
    /// Receive errors.
    pub rx_errs: u64,
    /// Dropped packets while receiving.
    pub rx_drop: u64,
    /// FIFO buffer errors while receiving.
    pub rx_fifo: u64,
    /// Frame alignment errors while receiving.
    pub rx_frame: u64,
    /// Compressed packets received.
    pub rx_compressed: u64,
    /// Multicast packets received.
    pub rx_multicast: u64,

    /// Bytes transmitted.
    pub tx_bytes: u64,
    /// Packets transmitted.
    pub tx_packets: u64,
    /// Transmit errors.
    pub tx_errs: u64,
    /// Dropped packets while transmitting.
    pub tx_drop: u64,
    /// FIFO buffer errors while transmitting.
    pub tx_fifo: u64,
    /// Collisions detected while transmitting.
    pub tx_colls: u64,
    /// Carrier loss errors while transmitting.
    pub tx_carrier: u64,
    /// Compressed packets transmitted.
    pub tx_compressed: u64,
}

/// Header lines of `/proc/net/dev`.
pub const NET_DEV_HEADER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

/// Splits `  eth0: 1 2 3 ...` into the interface name and its value fields.
fn parse_interface_line(line: &str) -> Option<(&str, impl Iterator<Item = &str>)> {
    let (iface, data) = line.trim().split_once(':')?;
    Some((iface.trim(), data.split_whitespace()))
}

/// Reads the 16 counters following the interface name.
///
/// Returns `None` if fewer than 16 fields are present. Unparsable fields count as 0.
fn stats_from_fields<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<NetworkStat> {
    let mut next = || fields.next().map(|f| f.parse::<u64>().unwrap_or(0));
    Some(NetworkStat {
        rx_bytes: next()?,
        rx_packets: next()?,
        rx_errs: next()?,
        rx_drop: next()?,
        rx_fifo: next()?,
        rx_frame: next()?,
        rx_compressed: next()?,
        rx_multicast: next()?,
        tx_bytes: next()?,
        tx_packets: next()?,
        tx_errs: next()?,
        tx_drop: next()?,
        tx_fifo: next()?,
        tx_colls: next()?,
        tx_carrier: next()?,
        tx_compressed: next()?,
    })
}

impl NetworkStat {
    /// Reads the counters of `iface` from a `/proc/net/dev`-formatted reader.
    ///
    /// Returns `Ok(None)` if the interface is not listed or its line is malformed.
    pub fn from_reader_for<R: BufRead>(buf: &mut R, iface: &str) -> std::io::Result<Option<Self>> {
        let mut line = String::new();

        // Skip headers (first two lines)
        for _ in 0..2 {
            buf.read_line(&mut line)?;
            line.clear();
        }

        while buf.read_line(&mut line)? != 0 {
            if let Some((name, fields)) = parse_interface_line(&line) {
                if name == iface {
                    return Ok(stats_from_fields(fields));
                }
            }
            line.clear();
        }

        Ok(None)
    }

    /// The counters as seen from the other end of a point-to-point link, such
    /// as the container side of a veth pair: what one end receives, the other
    /// transmitted.
    ///
    /// Frame, multicast, collision and carrier counters describe the local
    /// link only and are zeroed.
    pub fn peer_view(&self) -> Self {
        NetworkStat {
            rx_bytes: self.tx_bytes,
            rx_packets: self.tx_packets,
            rx_errs: self.tx_errs,
            rx_drop: self.tx_drop,
            rx_fifo: self.tx_fifo,
            rx_frame: 0,
            rx_compressed: self.tx_compressed,
            rx_multicast: 0,
            tx_bytes: self.rx_bytes,
            tx_packets: self.rx_packets,
            tx_errs: self.rx_errs,
            tx_drop: self.rx_drop,
            tx_fifo: self.rx_fifo,
            tx_colls: 0,
            tx_carrier: 0,
            tx_compressed: self.rx_compressed,
        }
    }

    /// Formats one `/proc/net/dev` line for `iface`.
    pub fn to_line(&self, iface: &str) -> String {
        format!(
            "{:>6}: {:>8} {:>7} {:>4} {:>4} {:>4} {:>5} {:>10} {:>9} {:>8} {:>7} {:>4} {:>4} {:>4} {:>5} {:>7} {:>10}\n",
            iface,
            self.rx_bytes,
            self.rx_packets,
            self.rx_errs,
            self.rx_drop,
            self.rx_fifo,
            self.rx_frame,
            self.rx_compressed,
            self.rx_multicast,
            self.tx_bytes,
            self.tx_packets,
            self.tx_errs,
            self.tx_drop,
            self.tx_fifo,
            self.tx_colls,
            self.tx_carrier,
            self.tx_compressed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 422198341   75815    0    0    0     0          0         0 422198341   75815    0    0    0     0       0          0
  eth0: 10240    100     0    0    0     0          0         0  20480   200     0    0    0     0       0          0
vethab12: 500 5 1 2 0 0 0 0 900 9 3 4 0 0 0 0
 badif: 123 456
";

    #[test]
    fn test_empty_input() {
        let stat = NetworkStat::from_reader_for(&mut "".as_bytes(), "eth0").unwrap();
        assert_eq!(stat, None);
    }

    #[test]
    fn test_find_interface() {
        let stat = NetworkStat::from_reader_for(&mut NET_DEV.as_bytes(), "eth0")
            .unwrap()
            .unwrap();
        assert_eq!(stat.rx_bytes, 10240);
        assert_eq!(stat.rx_packets, 100);
        assert_eq!(stat.tx_bytes, 20480);
        assert_eq!(stat.tx_packets, 200);
    }

    #[test]
    fn test_interface_name_must_match_exactly() {
        let stat = NetworkStat::from_reader_for(&mut NET_DEV.as_bytes(), "veth").unwrap();
        assert_eq!(stat, None);
    }

    #[test]
    fn test_malformed_line_too_few_fields() {
        let stat = NetworkStat::from_reader_for(&mut NET_DEV.as_bytes(), "badif").unwrap();
        assert_eq!(stat, None);
    }

    #[test]
    fn test_peer_view_swaps_directions() {
        let host = NetworkStat::from_reader_for(&mut NET_DEV.as_bytes(), "vethab12")
            .unwrap()
            .unwrap();
        let peer = host.peer_view();

        assert_eq!(peer.rx_bytes, 900);
        assert_eq!(peer.rx_packets, 9);
        assert_eq!(peer.rx_errs, 3);
        assert_eq!(peer.rx_drop, 4);
        assert_eq!(peer.tx_bytes, 500);
        assert_eq!(peer.tx_packets, 5);
        assert_eq!(peer.tx_errs, 1);
        assert_eq!(peer.tx_drop, 2);
    }

    #[test]
    fn test_to_line_round_trips_through_parser() {
        let stat = NetworkStat {
            rx_bytes: 1,
            rx_packets: 2,
            tx_bytes: 3,
            tx_packets: 4,
            ..Default::default()
        };
        let text = format!("{NET_DEV_HEADER}{}", stat.to_line("eth0"));
        let parsed = NetworkStat::from_reader_for(&mut text.as_bytes(), "eth0")
            .unwrap()
            .unwrap();
        assert_eq!(parsed, stat);
    }
}
