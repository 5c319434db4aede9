mod known_aps;
mod scans;
