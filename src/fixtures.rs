#[cfg(test)]
pub mod test {
    /// Upstream subscription file.
    pub const BASE_CONFIG: &str = "#!MANAGED-CONFIG https://base.example.com/sub interval=43200
[General]
loglevel = warning

[Proxy]
Direct = direct
HK 01 = trojan, hk1.example.com, 443, password=new
JP 01 = trojan, jp1.example.com, 443, password=new

[Proxy Group]
Auto = url-test, HK 01, JP 01, url=http://www.gstatic.com/generate_204
Streaming = select, JP 01, HK 01

[Rule]
DOMAIN-SUFFIX,google.com,Auto
FINAL,Auto

[Host]
router.local = 192.168.1.1
";

    /// The user's copy of an older subscription, with local edits.
    pub const MOD_CONFIG: &str = "#!MANAGED-CONFIG https://mod.example.com/sub interval=86400
[General]
#!include Base.conf
loglevel = notify

[Proxy]
Direct = direct
Block = reject
# CUSTOM START
MyNode = ss, my.example.com, 8388, encrypt-method=aes-128-gcm, password=secret
# CUSTOM END

# Synced from base config
HK 01 = trojan, hk1.example.com, 443, password=old
Old Node = trojan, old.example.com, 443, password=old

[Proxy Group]
Auto = url-test, HK 01, Old Node, url=http://www.gstatic.com/generate_204
Perps = select, MyNode, Direct

[Rule]
# CUSTOM START
DOMAIN-SUFFIX,corp.example,MyNode
# CUSTOM END
DOMAIN-SUFFIX,local.dev,DIRECT
FINAL,Auto

[MITM]
hostname = *.example.com
";

    /// Settings file content with every key set.
    pub const SETTINGS_TOML: &str = r#"base_config_path = "~/Surge/Base.conf"
mod_config_path = "~/Surge/Mod.conf"
backup_before_merge = false
"#;
}
