//! Parser da saída de `netstat -ano -p TCP` (Windows).

use inventory_core::types::ConnectionInfo;

/// Linhas do tipo `  TCP    192.168.0.10:50000    34.216.184.93:443    ESTABLISHED    4321`.
pub(super) fn parse_netstat_tcp(out: &str) -> Vec<ConnectionInfo> {
    out.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 || !fields[0].eq_ignore_ascii_case("TCP") {
                return None;
            }
            let (local_address, local_port) = split_endpoint(fields[1])?;
            let (remote_address, remote_port) = split_endpoint(fields[2])?;
            Some(ConnectionInfo {
                local_address,
                local_port,
                remote_address,
                remote_port,
                state: fields[3].to_string(),
                pid: fields[4].parse().ok(),
            })
        })
        .collect()
}

/// `1.2.3.4:80` ou `[::1]:80`.
fn split_endpoint(raw: &str) -> Option<(String, u16)> {
    let (addr, port) = raw.rsplit_once(':')?;
    let addr = addr.trim_start_matches('[').trim_end_matches(']');
    Some((addr.to_string(), port.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netstat_output_parsed() {
        let out = "
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1044
  TCP    192.168.0.10:50000     34.216.184.93:443      ESTABLISHED     4321
  TCP    [::1]:49664            [::]:0                 LISTENING       812
";
        let conns = parse_netstat_tcp(out);
        assert_eq!(conns.len(), 3);
        assert_eq!(conns[0].local_port, 135);
        assert_eq!(conns[0].pid, Some(1044));
        assert_eq!(conns[1].remote_address, "34.216.184.93");
        assert_eq!(conns[1].state, "ESTABLISHED");
        assert_eq!(conns[2].local_address, "::1");
        assert_eq!(conns[2].remote_address, "::");
    }
}
