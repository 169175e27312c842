//! Pre-built mock filesystem scenarios for testing.
//!
//! The file contents are captured from Lustre 2.x servers (an OSS exporting
//! `OST0001`, an MDS and the LNet debugfs counters) and are laid out under
//! the same paths the stock configuration points at.

use super::filesystem::MockFs;

/// Target used by all server scenarios.
pub const TARGET: &str = "OST0001";
/// Client NID used by the per-export scenarios.
pub const CLIENT_NID: &str = "10.2.4.27@o2ib1";

/// `/proc/fs/lustre/obdfilter/<target>/stats`
pub const OBDFILTER_STATS: &str = "\
snapshot_time             1438693064.430544 secs.usecs
read_bytes                203238095 samples [bytes] 4096 1048576 78026117632000
write_bytes               71893382 samples [bytes] 1 1048576 15201500833981
get_info                  1182008495 samples [reqs]
set_info_async            2 samples [reqs]
connect                   1117 samples [reqs]
reconnect                 1160 samples [reqs]
disconnect                1084 samples [reqs]
statfs                    3575885 samples [reqs]
create                    698 samples [reqs]
destroy                   3190060 samples [reqs]
setattr                   605647 samples [reqs]
punch                     805187 samples [reqs]
sync                      6608753 samples [reqs]
preprw                    275131477 samples [reqs]
commitrw                  275131477 samples [reqs]
quotactl                  229231 samples [reqs]
ping                      78020757 samples [reqs]
";

/// `/proc/fs/lustre/osd-ldiskfs/<target>/stats`
pub const OSD_LDISKFS_STATS: &str = "\
snapshot_time             1438693135.640551 secs.usecs
get_page                  275132812 samples [usec] 0 3147 1320420955 22041662259
cache_access              19047063027 samples [pages] 1 1 19047063027
cache_hit                 7393729777 samples [pages] 1 1 7393729777
cache_miss                11653333250 samples [pages] 1 1 11653333250
";

/// `/proc/fs/lustre/mdt/<target>/md_stats`
pub const MDT_MD_STATS: &str = "\
snapshot_time             1438693238.20113 secs.usecs
open                      1024577037 samples [reqs]
close                     873243496 samples [reqs]
mknod                     349042 samples [reqs]
link                      445 samples [reqs]
unlink                    3549417 samples [reqs]
mkdir                     705499 samples [reqs]
rmdir                     227434 samples [reqs]
rename                    629196 samples [reqs]
getattr                   1503663097 samples [reqs]
setattr                   1898364 samples [reqs]
getxattr                  6145349681 samples [reqs]
setxattr                  83969 samples [reqs]
statfs                    2916320 samples [reqs]
sync                      434081 samples [reqs]
samedir_rename            259625 samples [reqs]
crossdir_rename           369571 samples [reqs]
";

/// `/proc/fs/lustre/mdt/<target>/job_stats`
pub const MDT_JOB_STATS: &str = "\
job_stats:
- job_id:          cluster-testjob1
  snapshot_time:   1461772761
  open:            { samples:           5, unit:  reqs }
  close:           { samples:           4, unit:  reqs }
  mknod:           { samples:           6, unit:  reqs }
  link:            { samples:           8, unit:  reqs }
  unlink:          { samples:          90, unit:  reqs }
  mkdir:           { samples:         521, unit:  reqs }
  rmdir:           { samples:         520, unit:  reqs }
  rename:          { samples:           9, unit:  reqs }
  getattr:         { samples:          11, unit:  reqs }
  setattr:         { samples:           1, unit:  reqs }
  getxattr:        { samples:           3, unit:  reqs }
  setxattr:        { samples:           4, unit:  reqs }
  statfs:          { samples:        1205, unit:  reqs }
  sync:            { samples:           2, unit:  reqs }
  samedir_rename:  { samples:         705, unit:  reqs }
  crossdir_rename: { samples:         200, unit:  reqs }
- job_id:          testjob2
  snapshot_time:   1461772761
  open:            { samples:           6, unit:  reqs }
  close:           { samples:           7, unit:  reqs }
  mknod:           { samples:           8, unit:  reqs }
  link:            { samples:           9, unit:  reqs }
  unlink:          { samples:          20, unit:  reqs }
  mkdir:           { samples:         200, unit:  reqs }
  rmdir:           { samples:         210, unit:  reqs }
  rename:          { samples:           8, unit:  reqs }
  getattr:         { samples:          10, unit:  reqs }
  setattr:         { samples:           2, unit:  reqs }
  getxattr:        { samples:           4, unit:  reqs }
  setxattr:        { samples:           5, unit:  reqs }
  statfs:          { samples:        1207, unit:  reqs }
  sync:            { samples:           3, unit:  reqs }
  samedir_rename:  { samples:         706, unit:  reqs }
  crossdir_rename: { samples:         201, unit:  reqs }
";

/// `/proc/fs/lustre/obdfilter/<target>/job_stats`
pub const OBDFILTER_JOB_STATS: &str = "\
job_stats:
- job_id:          cluster-testjob1
  snapshot_time:   1461772761
  read_bytes:      { samples:           1, unit: bytes, min:    4096, max:    4096, sum:            4096 }
  write_bytes:     { samples:          25, unit: bytes, min: 1048576, max: 16777216, sum:        26214400 }
  getattr:         { samples:           0, unit:  reqs }
  setattr:         { samples:           0, unit:  reqs }
  punch:           { samples:           1, unit:  reqs }
  sync:            { samples:           0, unit:  reqs }
  destroy:         { samples:           0, unit:  reqs }
  create:          { samples:           0, unit:  reqs }
  statfs:          { samples:           0, unit:  reqs }
  get_info:        { samples:           0, unit:  reqs }
  set_info:        { samples:           0, unit:  reqs }
  quotactl:        { samples:           0, unit:  reqs }
- job_id:          testjob2
  snapshot_time:   1461772761
  read_bytes:      { samples:           1, unit: bytes, min:    1024, max:    1024, sum:            1024 }
  write_bytes:     { samples:          25, unit: bytes, min:    2048, max:     2048, sum:           51200 }
  getattr:         { samples:           0, unit:  reqs }
  setattr:         { samples:           0, unit:  reqs }
  punch:           { samples:           1, unit:  reqs }
  sync:            { samples:           0, unit:  reqs }
  destroy:         { samples:           0, unit:  reqs }
  create:          { samples:           0, unit:  reqs }
  statfs:          { samples:           0, unit:  reqs }
  get_info:        { samples:           0, unit:  reqs }
  set_info:        { samples:           0, unit:  reqs }
  quotactl:        { samples:           0, unit:  reqs }
";

/// `/sys/kernel/debug/lnet/stats`
pub const LNET_STATS: &str = "0 7 0 20481 28239 0 0 8892268623 8225856 0 0\n";

impl MockFs {
    /// Object storage server exporting [`TARGET`]: obdfilter and
    /// osd-ldiskfs stats plus obdfilter job_stats.
    pub fn lustre_oss() -> Self {
        let mut fs = Self::new();
        fs.add_oss_files();
        fs
    }

    /// Metadata server exporting [`TARGET`]: md_stats and job_stats.
    pub fn lustre_mds() -> Self {
        let mut fs = Self::new();
        fs.add_mds_files();
        fs
    }

    /// Combined server with OSS, MDS and LNet counters, as seen on a
    /// single-node test filesystem.
    pub fn lustre_server() -> Self {
        let mut fs = Self::new();
        fs.add_oss_files();
        fs.add_mds_files();
        fs.add_file("/sys/kernel/debug/lnet/stats", LNET_STATS);
        fs
    }

    /// Per-export stats for [`CLIENT_NID`] on both the obdfilter and mdt
    /// side of [`TARGET`].
    pub fn lustre_exports() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            format!("/proc/fs/lustre/obdfilter/{TARGET}/exports/{CLIENT_NID}/stats"),
            OBDFILTER_STATS,
        );
        fs.add_file(
            format!("/proc/fs/lustre/mdt/{TARGET}/exports/{CLIENT_NID}/stats"),
            MDT_MD_STATS,
        );
        fs
    }

    fn add_oss_files(&mut self) {
        self.add_file(
            format!("/proc/fs/lustre/obdfilter/{TARGET}/stats"),
            OBDFILTER_STATS,
        );
        self.add_file(
            format!("/proc/fs/lustre/osd-ldiskfs/{TARGET}/stats"),
            OSD_LDISKFS_STATS,
        );
        self.add_file(
            format!("/proc/fs/lustre/obdfilter/{TARGET}/job_stats"),
            OBDFILTER_JOB_STATS,
        );
    }

    fn add_mds_files(&mut self) {
        self.add_file(
            format!("/proc/fs/lustre/mdt/{TARGET}/md_stats"),
            MDT_MD_STATS,
        );
        self.add_file(
            format!("/proc/fs/lustre/mdt/{TARGET}/job_stats"),
            MDT_JOB_STATS,
        );
    }
}
