/// Arquivo: core/boot/cmdline.rs
///
/// Propósito: Parser da Linha de Comando do Kernel.
/// Gerencia os parâmetros passados pelo Bootloader
/// (ex: "quiet pgboost.interval=5 pgboost.event_enable=0").
///
/// Detalhes de Implementação:
/// - Armazenamento em buffer fixo (sem heap) para estar disponível muito cedo no boot.
/// - Parser simples de chave=valor separados por espaços.
/// - Flags sem valor ("debug") retornam `Some("")`.

/// Tamanho máximo da linha de comando
const CMDLINE_MAX_LEN: usize = 256;

pub struct CommandLine {
    buffer: [u8; CMDLINE_MAX_LEN],
    len: usize,
}

impl CommandLine {
    pub const fn new() -> Self {
        Self {
            buffer: [0; CMDLINE_MAX_LEN],
            len: 0,
        }
    }

    /// Cria a linha de comando a partir da string do bootloader.
    pub fn parse(args: &str) -> Self {
        let mut cmdline = Self::new();
        cmdline.init(args);
        cmdline
    }

    /// Inicializa a linha de comando com a string fornecida pelo bootloader.
    ///
    /// Linhas maiores que o buffer são truncadas na última fronteira UTF-8.
    pub fn init(&mut self, args: &str) {
        let bytes = args.as_bytes();
        let mut len = core::cmp::min(bytes.len(), CMDLINE_MAX_LEN);
        while !args.is_char_boundary(len) {
            len -= 1;
        }

        self.buffer[..len].copy_from_slice(&bytes[..len]);
        self.len = len;

        if len < bytes.len() {
            crate::kwarn!("(Cmdline) Linha truncada em {} bytes", len);
        }
    }

    /// Conteúdo bruto.
    pub fn as_str(&self) -> &str {
        // init() só copia fronteiras UTF-8 válidas
        core::str::from_utf8(&self.buffer[..self.len]).unwrap_or("")
    }

    /// Verifica se uma flag (chave sem valor) ou parâmetro existe.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Obtém o valor de um parâmetro (ex: "root" -> "/dev/sda").
    /// Se for flag ("debug"), retorna Some(""). A última ocorrência vence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params().filter(|(k, _)| *k == key).map(|(_, v)| v).last()
    }

    /// Itera pares `(chave, valor)` na ordem em que aparecem.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.as_str()
            .split_ascii_whitespace()
            .map(|token| match token.split_once('=') {
                Some((k, v)) => (k, v),
                None => (token, ""),
            })
    }

    /// Itera parâmetros de um módulo (`"<prefixo>.<nome>=<valor>"`),
    /// devolvendo `(nome, valor)` sem o prefixo.
    pub fn module_params<'a>(
        &'a self,
        module: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.params().filter_map(move |(k, v)| {
            k.strip_prefix(module)
                .and_then(|rest| rest.strip_prefix('.'))
                .map(|name| (name, v))
        })
    }
}

impl Default for CommandLine {
    fn default() -> Self {
        Self::new()
    }
}
