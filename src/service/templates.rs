//! Registration artifacts, one fixed template per init system.
//!
//! The text is a compatibility contract with the host init system. Only the
//! start and stop command lines are substituted.

const START: &str = "@START@";
const STOP: &str = "@STOP@";

const SYSTEMD_UNIT: &str = "[Unit]
Description=Psiphon Conduit Service
After=network.target docker.service
Wants=docker.service

[Service]
Type=oneshot
RemainAfterExit=yes
ExecStart=@START@
ExecStop=@STOP@

[Install]
WantedBy=multi-user.target
";

const OPENRC_SCRIPT: &str = "#!/sbin/openrc-run

name=\"conduit\"
description=\"Psiphon Conduit Service\"

depend() {
    need docker
    after network
}

start() {
    ebegin \"Starting Conduit\"
    @START@
    eend $?
}

stop() {
    ebegin \"Stopping Conduit\"
    @STOP@
    eend $?
}
";

const SYSVINIT_SCRIPT: &str = "#!/bin/sh
### BEGIN INIT INFO
# Provides:          conduit
# Required-Start:    $remote_fs $network docker
# Required-Stop:     $remote_fs $network docker
# Default-Start:     2 3 4 5
# Default-Stop:      0 1 6
# Short-Description: Psiphon Conduit Service
### END INIT INFO

case \"$1\" in
    start)
        @START@
        ;;
    stop)
        @STOP@
        ;;
    restart)
        @STOP@
        @START@
        ;;
    *)
        echo \"Usage: $0 {start|stop|restart}\"
        exit 1
        ;;
esac

exit 0
";

fn render(template: &str, start: &str, stop: &str) -> String {
    template.replace(START, start).replace(STOP, stop)
}

pub fn systemd_unit(start: &str, stop: &str) -> String {
    render(SYSTEMD_UNIT, start, stop)
}

pub fn openrc_script(start: &str, stop: &str) -> String {
    render(OPENRC_SCRIPT, start, stop)
}

pub fn sysvinit_script(start: &str, stop: &str) -> String {
    render(SYSVINIT_SCRIPT, start, stop)
}
