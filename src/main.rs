/// Entry point of cgroupfs.
///
/// Mounts the container-scoped `/proc` substitutes configured through the
/// environment and serves them until the filesystem is unmounted.
///
/// # Examples
///
/// ```bash
/// CGROUPFS_MOUNT_POINT=/var/lib/cgroupfs/abc \
/// CGROUPFS_CGROUP_PATH=/docker/abc \
/// CGROUPFS_INTERFACE=veth1a2b3c \
/// RUST_LOG=debug cargo run --features fuse
/// ```
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    cgroupfs::run()
}
