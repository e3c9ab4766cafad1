use std::io;
use std::path::PathBuf;

use crate::cgroup::stats::{NET_DEV_HEADER, NetworkStat};
use crate::fs::FileNode;

use super::{HostPaths, NET_DEV_INODE, read_file};

/// Name the container sees for its end of the link.
const CONTAINER_INTERFACE: &str = "eth0";

/// `/proc/net/dev` of a container attached through a host-side interface.
///
/// The backing path is the name of the host end of the link. Its counters are
/// reported from the container's point of view under [`CONTAINER_INTERFACE`].
#[derive(Debug, Clone)]
pub struct NetDevNode {
    interface: String,
    host: HostPaths,
}

impl NetDevNode {
    pub fn new(interface: PathBuf, host: HostPaths) -> Self {
        Self {
            interface: interface.to_string_lossy().into_owned(),
            host,
        }
    }
}

impl FileNode for NetDevNode {
    fn inode(&self) -> u64 {
        NET_DEV_INODE
    }

    fn read_content(&self) -> io::Result<Vec<u8>> {
        if self.interface.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no network interface configured",
            ));
        }

        let stat = read_file(&self.host.net_dev(), |reader| {
            NetworkStat::from_reader_for(reader, &self.interface)
        })?
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("interface {} not found", self.interface),
            )
        })?;

        let mut out = String::from(NET_DEV_HEADER);
        out.push_str(&stat.peer_view().to_line(CONTAINER_INTERFACE));
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HOST_NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 422198341   75815    0    0    0     0          0         0 422198341   75815    0    0    0     0       0          0
veth123: 500 5 1 2 0 7 0 3 900 9 0 0 0 1 1 0
";

    fn fixture(interface: &str) -> (tempfile::TempDir, NetDevNode) {
        let dir = tempfile::tempdir().unwrap();
        let proc_root = dir.path().join("proc");
        fs::create_dir_all(proc_root.join("net")).unwrap();
        fs::write(proc_root.join("net/dev"), HOST_NET_DEV).unwrap();

        let node = NetDevNode::new(PathBuf::from(interface), HostPaths::new(proc_root));
        (dir, node)
    }

    #[test]
    fn test_read_content_swaps_directions() {
        let (_dir, node) = fixture("veth123");
        let content = String::from_utf8(node.read_content().unwrap()).unwrap();

        assert!(content.starts_with(NET_DEV_HEADER));
        let stat = NetworkStat::from_reader_for(&mut content.as_bytes(), "eth0")
            .unwrap()
            .unwrap();
        assert_eq!(stat.rx_bytes, 900);
        assert_eq!(stat.rx_packets, 9);
        assert_eq!(stat.tx_bytes, 500);
        assert_eq!(stat.tx_packets, 5);
        assert_eq!(stat.tx_errs, 1);
        assert_eq!(stat.rx_frame, 0);
        assert_eq!(stat.rx_multicast, 0);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_unknown_interface() {
        let (_dir, node) = fixture("veth999");
        let err = node.read_content().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_no_interface_configured() {
        let (_dir, node) = fixture("");
        let err = node.read_content().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
